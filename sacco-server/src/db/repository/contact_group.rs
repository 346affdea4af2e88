//! Contact Group Repository

use super::{RepoError, RepoResult};
use shared::models::{ContactGroup, ContactGroupCreate, ContactGroupUpdate};
use sqlx::SqlitePool;

const GROUP_SELECT: &str = "SELECT id, name, description, member_count, last_used_at, is_active, created_at, updated_at FROM contact_group";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<ContactGroup>> {
    let sql = format!("{GROUP_SELECT} WHERE is_active = 1 ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ContactGroup>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ContactGroup>> {
    let sql = format!("{GROUP_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, ContactGroup>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ContactGroupCreate) -> RepoResult<ContactGroup> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM contact_group WHERE name = ?")
        .bind(&data.name)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Contact group {} already exists",
            data.name
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO contact_group (id, name, description, member_count, is_active, created_at, updated_at) VALUES (?, ?, ?, 0, 1, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create contact group".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ContactGroupUpdate) -> RepoResult<ContactGroup> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE contact_group SET name = COALESCE(?, name), description = COALESCE(?, description), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Contact group {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Contact group {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE contact_group SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Membership links ────────────────────────────────────────────────

/// Link members into the group. Existing inactive links are re-activated,
/// existing active links are left untouched.
pub async fn add_members(pool: &SqlitePool, group_id: i64, member_ids: &[i64]) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    for member_id in member_ids {
        sqlx::query(
            "INSERT INTO contact_group_member (group_id, member_id, is_active, created_at) VALUES (?, ?, 1, ?) ON CONFLICT(group_id, member_id) DO UPDATE SET is_active = 1",
        )
        .bind(group_id)
        .bind(member_id)
        .bind(now)
        .execute(pool)
        .await?;
    }
    refresh_member_count(pool, group_id).await
}

pub async fn remove_member(pool: &SqlitePool, group_id: i64, member_id: i64) -> RepoResult<i64> {
    let rows = sqlx::query(
        "UPDATE contact_group_member SET is_active = 0 WHERE group_id = ? AND member_id = ? AND is_active = 1",
    )
    .bind(group_id)
    .bind(member_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Member {member_id} is not in group {group_id}"
        )));
    }
    refresh_member_count(pool, group_id).await
}

/// Recompute `member_count` from active links; returns the new count
pub async fn refresh_member_count(pool: &SqlitePool, group_id: i64) -> RepoResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM contact_group_member WHERE group_id = ? AND is_active = 1",
    )
    .bind(group_id)
    .fetch_one(pool)
    .await?;

    sqlx::query("UPDATE contact_group SET member_count = ?, updated_at = ? WHERE id = ?")
        .bind(count)
        .bind(shared::util::now_millis())
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(count)
}

/// Stamp `last_used_at` when a campaign dispatches to the group
pub async fn touch_last_used(pool: &SqlitePool, group_id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE contact_group SET last_used_at = ? WHERE id = ?")
        .bind(now)
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(())
}
