//! Member Repository

use super::{RepoError, RepoResult};
use shared::models::{Member, MemberCreate, MemberUpdate};
use sqlx::SqlitePool;

const MEMBER_SELECT: &str = "SELECT id, member_no, name, phone, email, savings_balance, notes, is_active, created_at, updated_at FROM member";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Member>> {
    let sql = format!("{MEMBER_SELECT} WHERE is_active = 1 ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Member>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let sql = format!("{MEMBER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn search(pool: &SqlitePool, query: &str) -> RepoResult<Vec<Member>> {
    let pattern = format!("%{query}%");
    let sql = format!(
        "{MEMBER_SELECT} WHERE is_active = 1 AND (phone LIKE ?1 OR member_no LIKE ?1 OR name LIKE ?1) ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Member>(&sql)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: MemberCreate) -> RepoResult<Member> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM member WHERE member_no = ?")
        .bind(&data.member_no)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Member number {} already exists",
            data.member_no
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO member (id, member_no, name, phone, email, savings_balance, notes, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(&data.member_no)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create member".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: MemberUpdate) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE member SET name = COALESCE(?, name), phone = COALESCE(?, phone), email = COALESCE(?, email), notes = COALESCE(?, notes), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.notes)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE member SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Recipient directory (campaign audience resolution) ──────────────

/// Every active member with a phone number on file. Ordered by
/// enrollment, member number breaking same-millisecond ties.
pub async fn find_recipients_all(pool: &SqlitePool) -> RepoResult<Vec<Member>> {
    let sql = format!(
        "{MEMBER_SELECT} WHERE is_active = 1 AND phone IS NOT NULL ORDER BY created_at ASC, member_no ASC"
    );
    let rows = sqlx::query_as::<_, Member>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Active members linked to the group through an active membership,
/// phone number on file, in membership order.
pub async fn find_recipients_by_group(pool: &SqlitePool, group_id: i64) -> RepoResult<Vec<Member>> {
    let rows = sqlx::query_as::<_, Member>(
        "SELECT m.id, m.member_no, m.name, m.phone, m.email, m.savings_balance, m.notes, m.is_active, m.created_at, m.updated_at FROM member m JOIN contact_group_member gm ON gm.member_id = m.id WHERE gm.group_id = ? AND gm.is_active = 1 AND m.is_active = 1 AND m.phone IS NOT NULL ORDER BY gm.created_at ASC, m.member_no ASC",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
