//! Contact Group Model

use serde::{Deserialize, Serialize};

/// Contact group entity (通讯组) — a named collection of members used as a
/// campaign audience. `member_count` tracks active links; `last_used_at`
/// is stamped when a campaign dispatches to the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ContactGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub member_count: i64,
    pub last_used_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create contact group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroupCreate {
    pub name: String,
    pub description: Option<String>,
}

/// Update contact group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Add members to a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembersAdd {
    pub member_ids: Vec<i64>,
}
