//! Permission Resolver
//!
//! Database-driven effective-permission computation. A user's grants come
//! from two places, layered:
//!
//! 1. the single primary role named on the user record (`user.role_name`)
//! 2. explicit, time-bounded role assignments (`user_role` rows)
//!
//! Every check re-queries the store. There is deliberately no cache here,
//! so a role or assignment mutation takes effect on the next request.
//! Stale denials/grants are worse than the extra lookups at this scale.
//!
//! Expiry boundary: an assignment whose `expires_at` equals the current
//! millisecond still contributes; only strictly-past expiries are dead.
//! Inactive assignments and inactive roles never contribute, regardless
//! of expiry.

use shared::models::{EffectivePermissions, User};
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;

use crate::db::repository::user;
use crate::security_log;

/// DB-backed permission resolver
#[derive(Clone)]
pub struct PermissionResolver {
    pool: SqlitePool,
}

impl PermissionResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 检查用户是否拥有指定权限
    ///
    /// Super admins are granted unconditionally. Otherwise the primary
    /// role is consulted first, then the union of live assignments.
    pub async fn has_permission(&self, user_id: i64, permission: &str) -> AppResult<bool> {
        let user = self.load_user(user_id).await?;
        if user.is_super_admin {
            return Ok(true);
        }

        let primary = self.primary_role_permissions(&user.role_name).await?;
        if primary.iter().any(|p| p == permission) {
            return Ok(true);
        }

        let assigned = self.assignment_permissions(user_id).await?;
        Ok(assigned.iter().any(|p| p == permission))
    }

    /// 检查用户是否拥有任一指定权限
    pub async fn has_any_permission(&self, user_id: i64, permissions: &[&str]) -> AppResult<bool> {
        let user = self.load_user(user_id).await?;
        if user.is_super_admin {
            return Ok(true);
        }

        let primary = self.primary_role_permissions(&user.role_name).await?;
        if permissions.iter().any(|p| primary.iter().any(|h| h == p)) {
            return Ok(true);
        }

        let assigned = self.assignment_permissions(user_id).await?;
        Ok(permissions.iter().any(|p| assigned.iter().any(|h| h == p)))
    }

    /// 检查用户是否拥有全部指定权限
    ///
    /// Only explicit assignments are consulted here, not the primary
    /// role. This asymmetry with [`has_any_permission`] is inherited from
    /// the legacy access model and is preserved as observed.
    // TODO: product decision pending on whether has_all_permissions should
    // also consult the primary role; keep the two variants in sync with
    // whatever is decided.
    pub async fn has_all_permissions(&self, user_id: i64, permissions: &[&str]) -> AppResult<bool> {
        let user = self.load_user(user_id).await?;
        if user.is_super_admin {
            return Ok(true);
        }

        let assigned = self.assignment_permissions(user_id).await?;
        Ok(permissions
            .iter()
            .all(|p| assigned.iter().any(|h| h == p)))
    }

    /// 计算用户的有效角色与权限集合
    ///
    /// Roles and permissions are deduplicated and sorted, so two calls
    /// without an intervening mutation return identical sets.
    pub async fn get_effective_permissions(&self, user_id: i64) -> AppResult<EffectivePermissions> {
        let user = self.load_user(user_id).await?;

        let mut roles = Vec::new();
        let primary_active: Option<(String,)> =
            sqlx::query_as("SELECT name FROM role WHERE name = ? AND is_active = 1")
                .bind(&user.role_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(e.to_string()))?;
        if let Some((name,)) = primary_active {
            roles.push(name);
        }
        roles.extend(self.assigned_role_names(user_id).await?);
        roles.sort();
        roles.dedup();

        let mut permissions = self.primary_role_permissions(&user.role_name).await?;
        permissions.extend(self.assignment_permissions(user_id).await?);
        permissions.sort();
        permissions.dedup();

        Ok(EffectivePermissions { roles, permissions })
    }

    /// 权限断言：无权限时返回结构化的 PermissionDenied
    ///
    /// The denial carries the required permission name in `details` so the
    /// API boundary can surface it for diagnostics.
    pub async fn authorize(&self, user_id: i64, permission: &str) -> AppResult<()> {
        if self.has_permission(user_id, permission).await? {
            return Ok(());
        }

        security_log!(
            "WARN",
            "permission_denied",
            user_id = user_id,
            required_permission = permission
        );

        Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            format!("Permission denied: {permission}"),
        )
        .with_detail("required", permission))
    }

    // ── Internal queries ────────────────────────────────────────────

    async fn load_user(&self, user_id: i64) -> AppResult<User> {
        user::find_by_id(&self.pool, user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::UserNotFound, format!("User {user_id} not found"))
            })
    }

    /// Permission names granted by the primary role; empty when the role
    /// is unknown or inactive.
    async fn primary_role_permissions(&self, role_name: &str) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT p.name FROM role r JOIN role_permission rp ON rp.role_id = r.id JOIN permission p ON p.id = rp.permission_id WHERE r.name = ? AND r.is_active = 1",
        )
        .bind(role_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Union of permission names over live explicit assignments:
    /// assignment active, not expired (boundary inclusive), role active.
    async fn assignment_permissions(&self, user_id: i64) -> AppResult<Vec<String>> {
        let now = shared::util::now_millis();
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT p.name FROM user_role ur JOIN role r ON r.id = ur.role_id JOIN role_permission rp ON rp.role_id = r.id JOIN permission p ON p.id = rp.permission_id WHERE ur.user_id = ? AND ur.is_active = 1 AND (ur.expires_at IS NULL OR ur.expires_at >= ?) AND r.is_active = 1",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Role names behind the live explicit assignments
    async fn assigned_role_names(&self, user_id: i64) -> AppResult<Vec<String>> {
        let now = shared::util::now_millis();
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT r.name FROM user_role ur JOIN role r ON r.id = ur.role_id WHERE ur.user_id = ? AND ur.is_active = 1 AND (ur.expires_at IS NULL OR ur.expires_at >= ?) AND r.is_active = 1",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
