//! 审计日志存储
//!
//! SQLite `audit_log` 表的 append-only 访问。写入时计算 SHA256 哈希链；
//! 读取端提供过滤分页查询和链完整性验证。

use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use thiserror::Error;

use super::types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditListResponse, AuditQuery,
};

/// 创世哈希（链头之前）
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("audit storage database error: {0}")]
    Database(String),

    #[error("audit entry serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for AuditStorageError {
    fn from(err: sqlx::Error) -> Self {
        AuditStorageError::Database(err.to_string())
    }
}

/// 审计日志存储
#[derive(Clone)]
pub struct AuditStorage {
    pool: SqlitePool,
}

impl AuditStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 追加一条审计记录，返回完整条目
    pub async fn append(
        &self,
        action: AuditAction,
        resource_type: String,
        resource_id: String,
        operator_id: Option<i64>,
        operator_name: Option<String>,
        details: serde_json::Value,
    ) -> Result<AuditEntry, AuditStorageError> {
        let prev_hash: String = sqlx::query_scalar::<_, String>(
            "SELECT curr_hash FROM audit_log ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .unwrap_or_else(|| GENESIS_HASH.to_string());

        let timestamp = shared::util::now_millis();
        let action_str = action_to_str(action)?;
        let details_str = details.to_string();
        let curr_hash = compute_hash(
            &prev_hash,
            timestamp,
            &action_str,
            &resource_type,
            &resource_id,
            operator_id,
            operator_name.as_deref(),
            &details_str,
        );

        let result = sqlx::query(
            "INSERT INTO audit_log (timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(timestamp)
        .bind(&action_str)
        .bind(&resource_type)
        .bind(&resource_id)
        .bind(operator_id)
        .bind(&operator_name)
        .bind(&details_str)
        .bind(&prev_hash)
        .bind(&curr_hash)
        .execute(&self.pool)
        .await?;

        Ok(AuditEntry {
            id: result.last_insert_rowid(),
            timestamp,
            action,
            resource_type,
            resource_id,
            operator_id,
            operator_name,
            details,
            prev_hash,
            curr_hash,
        })
    }

    /// 过滤分页查询（新记录在前）
    pub async fn list(&self, query: &AuditQuery) -> Result<AuditListResponse, AuditStorageError> {
        let mut conditions = Vec::new();
        if query.from.is_some() {
            conditions.push("timestamp >= ?");
        }
        if query.to.is_some() {
            conditions.push("timestamp <= ?");
        }
        if query.resource_type.is_some() {
            conditions.push("resource_type = ?");
        }
        if query.operator_id.is_some() {
            conditions.push("operator_id = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_log{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(from) = query.from {
            count_query = count_query.bind(from);
        }
        if let Some(to) = query.to {
            count_query = count_query.bind(to);
        }
        if let Some(resource_type) = &query.resource_type {
            count_query = count_query.bind(resource_type);
        }
        if let Some(operator_id) = query.operator_id {
            count_query = count_query.bind(operator_id);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT id, timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash FROM audit_log{where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(from) = query.from {
            list_query = list_query.bind(from);
        }
        if let Some(to) = query.to {
            list_query = list_query.bind(to);
        }
        if let Some(resource_type) = &query.resource_type {
            list_query = list_query.bind(resource_type);
        }
        if let Some(operator_id) = query.operator_id {
            list_query = list_query.bind(operator_id);
        }
        let rows = list_query
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuditListResponse { items, total })
    }

    /// 重算整条链，返回断裂点
    pub async fn verify_chain(&self) -> Result<AuditChainVerification, AuditStorageError> {
        let rows = sqlx::query(
            "SELECT id, timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash FROM audit_log ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut breaks = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();
        let total_entries = rows.len() as i64;

        for row in rows {
            let entry = entry_from_row(row)?;

            if entry.prev_hash != expected_prev {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected: expected_prev.clone(),
                    actual: entry.prev_hash.clone(),
                });
            }

            let action_str = action_to_str(entry.action)?;
            let recomputed = compute_hash(
                &entry.prev_hash,
                entry.timestamp,
                &action_str,
                &entry.resource_type,
                &entry.resource_id,
                entry.operator_id,
                entry.operator_name.as_deref(),
                &entry.details.to_string(),
            );
            if recomputed != entry.curr_hash {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected: recomputed,
                    actual: entry.curr_hash.clone(),
                });
            }

            expected_prev = entry.curr_hash;
        }

        Ok(AuditChainVerification {
            total_entries,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_hash(
    prev_hash: &str,
    timestamp: i64,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    operator_id: Option<i64>,
    operator_name: Option<&str>,
    details: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.to_le_bytes());
    hasher.update(b"|");
    hasher.update(action.as_bytes());
    hasher.update(b"|");
    hasher.update(resource_type.as_bytes());
    hasher.update(b"|");
    hasher.update(resource_id.as_bytes());
    hasher.update(b"|");
    hasher.update(operator_id.unwrap_or(0).to_le_bytes());
    hasher.update(b"|");
    hasher.update(operator_name.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(details.as_bytes());
    hex::encode(hasher.finalize())
}

fn action_to_str(action: AuditAction) -> Result<String, AuditStorageError> {
    match serde_json::to_value(action) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        _ => Err(AuditStorageError::Serialization(format!(
            "unserializable audit action: {action:?}"
        ))),
    }
}

fn action_from_str(s: &str) -> Result<AuditAction, AuditStorageError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| AuditStorageError::Serialization(format!("unknown audit action {s}: {e}")))
}

fn entry_from_row(row: SqliteRow) -> Result<AuditEntry, AuditStorageError> {
    let action: String = row.get("action");
    let details_raw: String = row.get("details");
    let details = serde_json::from_str(&details_raw)
        .map_err(|e| AuditStorageError::Serialization(format!("bad details JSON: {e}")))?;

    Ok(AuditEntry {
        id: row.get("id"),
        timestamp: row.get("timestamp"),
        action: action_from_str(&action)?,
        resource_type: row.get("resource_type"),
        resource_id: row.get("resource_id"),
        operator_id: row.get("operator_id"),
        operator_name: row.get("operator_name"),
        details,
        prev_hash: row.get("prev_hash"),
        curr_hash: row.get("curr_hash"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = compute_hash(GENESIS_HASH, 1, "login_success", "user", "1", Some(1), Some("jane"), "{}");
        let b = compute_hash(GENESIS_HASH, 1, "login_success", "user", "1", Some(1), Some("jane"), "{}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_chains_differ_on_any_field() {
        let base = compute_hash(GENESIS_HASH, 1, "login_success", "user", "1", None, None, "{}");
        let other = compute_hash(GENESIS_HASH, 2, "login_success", "user", "1", None, None, "{}");
        assert_ne!(base, other);
    }

    #[test]
    fn test_action_roundtrip() {
        let s = action_to_str(AuditAction::CampaignDispatched).unwrap();
        assert_eq!(s, "campaign_dispatched");
        assert_eq!(action_from_str(&s).unwrap(), AuditAction::CampaignDispatched);
    }
}
