//! Role Assignment Repository
//!
//! Explicit, time-bounded role grants (`user_role` table). The permission
//! resolver reads these through its own queries; this module is plain CRUD.

use super::{RepoError, RepoResult};
use shared::models::{RoleAssignment, RoleAssignmentWithRole};
use sqlx::SqlitePool;

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<RoleAssignmentWithRole>> {
    let rows = sqlx::query_as::<_, RoleAssignmentWithRole>(
        "SELECT ur.id, ur.user_id, ur.role_id, r.name AS role_name, ur.expires_at, ur.is_active, ur.created_at FROM user_role ur JOIN role r ON r.id = ur.role_id WHERE ur.user_id = ? ORDER BY ur.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RoleAssignment>> {
    let row = sqlx::query_as::<_, RoleAssignment>(
        "SELECT id, user_id, role_id, expires_at, is_active, assigned_by, created_at FROM user_role WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    role_id: i64,
    expires_at: Option<i64>,
    assigned_by: Option<i64>,
) -> RepoResult<RoleAssignment> {
    let existing: Option<(i64, bool)> =
        sqlx::query_as("SELECT id, is_active FROM user_role WHERE user_id = ? AND role_id = ?")
            .bind(user_id)
            .bind(role_id)
            .fetch_optional(pool)
            .await?;
    if let Some((existing_id, is_active)) = existing {
        if is_active {
            return Err(RepoError::Duplicate(format!(
                "Role {role_id} already assigned to user {user_id}"
            )));
        }
        // Revoked grant for the same role: reactivate with the new terms
        sqlx::query(
            "UPDATE user_role SET is_active = 1, expires_at = ?, assigned_by = ? WHERE id = ?",
        )
        .bind(expires_at)
        .bind(assigned_by)
        .bind(existing_id)
        .execute(pool)
        .await?;
        return find_by_id(pool, existing_id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to reactivate role assignment".into()));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO user_role (id, user_id, role_id, expires_at, is_active, assigned_by, created_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(role_id)
    .bind(expires_at)
    .bind(assigned_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role assignment".into()))
}

/// Revoke an assignment by flipping `is_active`; the row stays for history.
pub async fn revoke(pool: &SqlitePool, user_id: i64, assignment_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE user_role SET is_active = 0 WHERE id = ? AND user_id = ? AND is_active = 1",
    )
    .bind(assignment_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
