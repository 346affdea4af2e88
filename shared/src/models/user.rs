//! User Model

use serde::{Deserialize, Serialize};

/// Back-office user account (职员账户)
///
/// `role_name` is the single primary role carried directly on the record;
/// additional grants live in the `user_role` assignment table.
/// Users are never physically deleted; `is_active` is the soft status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Argon2 password hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Primary (legacy) role name
    pub role_name: String,
    /// Super admins bypass every permission check
    pub is_super_admin: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_name: String,
    #[serde(default)]
    pub is_super_admin: bool,
}

/// Update user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role_name: Option<String>,
    pub is_super_admin: Option<bool>,
    pub is_active: Option<bool>,
}

/// Explicit role assignment (时限角色授权)
///
/// Layered on top of the primary role. An assignment with `expires_at`
/// in the past or `is_active = false` contributes no permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoleAssignment {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
    /// Unix millis; None = no expiry
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub assigned_by: Option<i64>,
    pub created_at: i64,
}

/// Create role assignment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignmentCreate {
    pub role_id: i64,
    pub expires_at: Option<i64>,
}

/// Assignment joined with its role (for list/detail views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoleAssignmentWithRole {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Effective permission set for a user: the union of the primary role and
/// all live explicit assignments. Set semantics: both lists are sorted
/// and deduplicated so repeated calls compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}
