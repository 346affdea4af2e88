//! Startup Seeding
//!
//! First boot writes the system permission catalog, the three stock roles
//! and an initial super-admin account. Re-runs are no-ops: each block
//! keys off "is the table empty" / "does the row exist", so operator
//! customizations survive restarts.

use sqlx::SqlitePool;

use crate::auth::password::hash_password;
use crate::auth::permissions::{SYSTEM_PERMISSIONS, default_role_permissions};
use crate::core::Config;
use crate::db::repository::{RepoError, RepoResult, permission, role, user};
use shared::models::PermissionCreate;

/// 默认角色: (名称, 描述, 等级)
const DEFAULT_ROLES: &[(&str, &str, i32)] = &[
    ("admin", "Full back-office administration", 100),
    ("officer", "Member services and messaging", 50),
    ("clerk", "Read-only counter access", 10),
];

pub async fn seed_if_empty(pool: &SqlitePool, config: &Config) -> RepoResult<()> {
    seed_permissions(pool).await?;
    seed_roles(pool).await?;
    seed_admin_user(pool, config).await?;
    Ok(())
}

async fn seed_permissions(pool: &SqlitePool) -> RepoResult<()> {
    if permission::count(pool).await? > 0 {
        return Ok(());
    }

    for (module, resource, action, description) in SYSTEM_PERMISSIONS {
        permission::create(
            pool,
            PermissionCreate {
                module: module.to_string(),
                resource: resource.to_string(),
                action: action.to_string(),
                description: Some(description.to_string()),
            },
            true,
        )
        .await?;
    }
    tracing::info!(
        count = SYSTEM_PERMISSIONS.len(),
        "Seeded system permission catalog"
    );
    Ok(())
}

async fn seed_roles(pool: &SqlitePool) -> RepoResult<()> {
    for (name, description, level) in DEFAULT_ROLES {
        if role::find_by_name(pool, name).await?.is_some() {
            continue;
        }

        let now = shared::util::now_millis();
        let id = shared::util::snowflake_id();
        sqlx::query(
            "INSERT INTO role (id, name, description, level, is_system, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, 1, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(level)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        role::set_permissions(pool, id, &default_role_permissions(name)).await?;
        tracing::info!(role = name, "Seeded system role");
    }
    Ok(())
}

async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> RepoResult<()> {
    if user::count(pool).await? > 0 {
        return Ok(());
    }

    let (password, generated) = match &config.admin_initial_password {
        Some(p) => (p.clone(), false),
        None => (crate::auth::jwt::generate_secure_printable_jwt_secret()[..16].to_string(), true),
    };
    let password_hash = hash_password(&password)
        .map_err(|e| RepoError::Validation(format!("Failed to hash admin password: {e}")))?;

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO user (id, username, display_name, email, phone, password_hash, role_name, is_super_admin, is_active, created_at, updated_at) VALUES (?, 'admin', 'Administrator', NULL, NULL, ?, 'admin', 1, 1, ?, ?)",
    )
    .bind(id)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if generated {
        // Printed once on first boot; set ADMIN_INITIAL_PASSWORD to avoid this
        tracing::warn!("Created initial admin user with generated password: {password}");
    } else {
        tracing::info!("Created initial admin user");
    }
    Ok(())
}
