//! Campaign Repository
//!
//! Lifecycle transitions are conditional UPDATEs keyed on the current
//! status column, so two dispatchers racing on the same campaign cannot
//! both win the draft/scheduled → sending transition.

use super::{RepoError, RepoResult};
use shared::models::{Campaign, CampaignCreate, CampaignStatus, CampaignUpdate};
use sqlx::SqlitePool;

const CAMPAIGN_SELECT: &str = "SELECT id, name, body, target_type, group_id, status, total_recipients, sent_count, failed_count, started_at, completed_at, created_by, created_at, updated_at FROM campaign";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Campaign>> {
    let sql = format!("{CAMPAIGN_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Campaign>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Campaign>> {
    let sql = format!("{CAMPAIGN_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Campaign>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    data: CampaignCreate,
    created_by: Option<i64>,
) -> RepoResult<Campaign> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO campaign (id, name, body, target_type, group_id, status, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'draft', ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.body)
    .bind(data.target_type)
    .bind(data.group_id)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create campaign".into()))
}

/// Update template fields; only meaningful for draft campaigns (the
/// caller checks the lifecycle state first).
pub async fn update(pool: &SqlitePool, id: i64, data: CampaignUpdate) -> RepoResult<Campaign> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE campaign SET name = COALESCE(?, name), body = COALESCE(?, body), target_type = COALESCE(?, target_type), group_id = COALESCE(?, group_id), updated_at = ? WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.body)
    .bind(data.target_type)
    .bind(data.group_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Campaign {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))
}

/// Compare-and-swap the campaign into `sending`.
///
/// Returns false when the campaign was not in `draft`/`scheduled`,
/// including when a concurrent dispatch won the transition first.
pub async fn try_begin_dispatch(
    pool: &SqlitePool,
    id: i64,
    total_recipients: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE campaign SET status = 'sending', total_recipients = ?, started_at = ?, updated_at = ? WHERE id = ? AND status IN ('draft', 'scheduled')",
    )
    .bind(total_recipients)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Persist final counters and terminal status after the send loop
pub async fn finish_dispatch(
    pool: &SqlitePool,
    id: i64,
    status: CampaignStatus,
    sent_count: i64,
    failed_count: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE campaign SET status = ?, sent_count = ?, failed_count = ?, completed_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status)
    .bind(sent_count)
    .bind(failed_count)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Compare-and-swap a draft/scheduled campaign into `cancelled`.
/// A campaign already `sending` cannot be cancelled.
pub async fn try_cancel(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE campaign SET status = 'cancelled', completed_at = ?, updated_at = ? WHERE id = ? AND status IN ('draft', 'scheduled')",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
