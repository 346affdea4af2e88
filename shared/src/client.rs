//! Client-related types shared between server and client
//!
//! Common request/response types used in API communication.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// User information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub is_super_admin: bool,
}

// =============================================================================
// Permission API DTOs
// =============================================================================

/// How a multi-permission check combines its names
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Granted when any listed permission is held
    Any,
    /// Granted only when every listed permission is held
    All,
}

/// Permission check request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckRequest {
    /// Dotted permission names (`module.resource.action`)
    pub permissions: Vec<String>,
    #[serde(default = "default_check_mode")]
    pub mode: CheckMode,
}

fn default_check_mode() -> CheckMode {
    CheckMode::Any
}

/// Permission check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCheckResponse {
    pub granted: bool,
    /// The permission names that were required but not held
    #[serde(default)]
    pub missing: Vec<String>,
}
