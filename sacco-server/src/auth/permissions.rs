//! Permission Definitions
//!
//! Data-driven RBAC permission catalog.
//!
//! ## 设计原则
//! - 权限名为点分三元组 `module.resource.action`，大小写敏感，无通配符
//! - 系统权限由启动播种写入，不可删除
//! - 超级管理员标志绕过所有检查，不依赖本目录

/// System permission catalog: (module, resource, action, description).
/// Seeded at first startup; referenced permissions cannot be deleted.
pub const SYSTEM_PERMISSIONS: &[(&str, &str, &str, &str)] = &[
    // === 后台管理 ===
    ("admin", "users", "view", "List and inspect back-office users"),
    ("admin", "users", "manage", "Create and update back-office users"),
    ("admin", "roles", "view", "List roles and their permission sets"),
    ("admin", "roles", "manage", "Create, update and delete roles"),
    ("admin", "permissions", "manage", "Define and remove permissions"),

    // === 社员档案 ===
    ("members", "records", "view", "Browse the member directory"),
    ("members", "records", "manage", "Create and update member records"),

    // === 消息群发 ===
    ("messaging", "groups", "view", "Browse contact groups"),
    ("messaging", "groups", "manage", "Create and maintain contact groups"),
    ("messaging", "campaigns", "view", "Browse campaigns and their progress"),
    ("messaging", "campaigns", "manage", "Create, edit and cancel campaigns"),
    ("messaging", "campaigns", "send", "Dispatch a campaign to its audience"),
    ("messaging", "messages", "view", "Browse per-recipient message history"),

    // === 报表 ===
    ("reports", "audit", "view", "Read the audit trail"),
];

// Permission name constants used at authorization call sites
pub const PERM_USERS_VIEW: &str = "admin.users.view";
pub const PERM_USERS_MANAGE: &str = "admin.users.manage";
pub const PERM_ROLES_VIEW: &str = "admin.roles.view";
pub const PERM_ROLES_MANAGE: &str = "admin.roles.manage";
pub const PERM_PERMISSIONS_MANAGE: &str = "admin.permissions.manage";
pub const PERM_MEMBERS_VIEW: &str = "members.records.view";
pub const PERM_MEMBERS_MANAGE: &str = "members.records.manage";
pub const PERM_GROUPS_VIEW: &str = "messaging.groups.view";
pub const PERM_GROUPS_MANAGE: &str = "messaging.groups.manage";
pub const PERM_CAMPAIGNS_VIEW: &str = "messaging.campaigns.view";
pub const PERM_CAMPAIGNS_MANAGE: &str = "messaging.campaigns.manage";
pub const PERM_CAMPAIGNS_SEND: &str = "messaging.campaigns.send";
pub const PERM_MESSAGES_VIEW: &str = "messaging.messages.view";
pub const PERM_AUDIT_VIEW: &str = "reports.audit.view";

/// 经办员默认权限（社员与消息全功能，无后台管理）
pub const DEFAULT_OFFICER_PERMISSIONS: &[&str] = &[
    PERM_MEMBERS_VIEW,
    PERM_MEMBERS_MANAGE,
    PERM_GROUPS_VIEW,
    PERM_GROUPS_MANAGE,
    PERM_CAMPAIGNS_VIEW,
    PERM_CAMPAIGNS_MANAGE,
    PERM_CAMPAIGNS_SEND,
    PERM_MESSAGES_VIEW,
];

/// 柜员默认权限（仅查看）
pub const DEFAULT_CLERK_PERMISSIONS: &[&str] = &[
    PERM_MEMBERS_VIEW,
    PERM_GROUPS_VIEW,
    PERM_CAMPAIGNS_VIEW,
];

/// Default permission names for a seeded role.
/// The admin role gets the full catalog.
pub fn default_role_permissions(role_name: &str) -> Vec<String> {
    match role_name {
        "admin" => SYSTEM_PERMISSIONS
            .iter()
            .map(|(m, r, a, _)| shared::models::permission_name(m, r, a))
            .collect(),
        "officer" => DEFAULT_OFFICER_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        "clerk" => DEFAULT_CLERK_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<String> = SYSTEM_PERMISSIONS
            .iter()
            .map(|(m, r, a, _)| shared::models::permission_name(m, r, a))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_default_sets_are_subset_of_catalog() {
        let catalog: Vec<String> = default_role_permissions("admin");
        for name in default_role_permissions("officer") {
            assert!(catalog.contains(&name), "officer permission {name} not in catalog");
        }
        for name in default_role_permissions("clerk") {
            assert!(catalog.contains(&name), "clerk permission {name} not in catalog");
        }
    }

    #[test]
    fn test_unknown_role_has_no_defaults() {
        assert!(default_role_permissions("loan_shark").is_empty());
    }
}
