//! Message Repository
//!
//! Message rows are written by the dispatcher during a send loop and are
//! read-only history afterwards; there is no update path besides the
//! pending → sent/failed transition.

use super::{RepoError, RepoResult};
use shared::models::Message;
use sqlx::SqlitePool;

const MESSAGE_SELECT: &str = "SELECT id, campaign_id, member_id, phone, body, units, status, provider_id, error, sent_at, failed_at, created_at FROM message";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Message>> {
    let sql = format!("{MESSAGE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Message>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_campaign(pool: &SqlitePool, campaign_id: i64) -> RepoResult<Vec<Message>> {
    let sql = format!("{MESSAGE_SELECT} WHERE campaign_id = ? ORDER BY created_at ASC");
    let rows = sqlx::query_as::<_, Message>(&sql)
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Insert one outbound message in `pending` state; returns its id
pub async fn create_pending(
    pool: &SqlitePool,
    campaign_id: Option<i64>,
    member_id: Option<i64>,
    phone: &str,
    body: &str,
    units: i64,
    now: i64,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO message (id, campaign_id, member_id, phone, body, units, status, created_at) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(id)
    .bind(campaign_id)
    .bind(member_id)
    .bind(phone)
    .bind(body)
    .bind(units)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn mark_sent(
    pool: &SqlitePool,
    id: i64,
    provider_id: &str,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE message SET status = 'sent', provider_id = ?, sent_at = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(provider_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Pending message {id} not found")));
    }
    Ok(())
}

pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str, now: i64) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE message SET status = 'failed', error = ?, failed_at = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(error)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Pending message {id} not found")));
    }
    Ok(())
}
