//! Permission Model

use serde::{Deserialize, Serialize};

/// Permission entity (权限)
///
/// A (module, resource, action) triple serialized to a dotted `name`
/// (`module.resource.action`). Names are case-sensitive exact matches;
/// there are no wildcard semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub module: String,
    pub resource: String,
    pub action: String,
    /// Dotted name, unique: `module.resource.action`
    pub name: String,
    pub description: Option<String>,
    /// System permissions cannot be deleted while referenced
    pub is_system: bool,
    pub created_at: i64,
}

/// Create permission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCreate {
    pub module: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// Build the dotted permission name from its triple
pub fn permission_name(module: &str, resource: &str, action: &str) -> String {
    format!("{module}.{resource}.{action}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_name() {
        assert_eq!(
            permission_name("sms", "campaigns", "send"),
            "sms.campaigns.send"
        );
    }
}
