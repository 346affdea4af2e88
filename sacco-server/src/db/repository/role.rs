//! Role Repository

use super::{RepoError, RepoResult};
use shared::models::{Role, RoleCreate, RoleUpdate, RoleWithPermissions};
use sqlx::SqlitePool;

const ROLE_SELECT: &str =
    "SELECT id, name, description, level, is_system, is_active, created_at, updated_at FROM role";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("{ROLE_SELECT} ORDER BY level DESC, name ASC");
    let rows = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Role>> {
    let sql = format!("{ROLE_SELECT} WHERE name = ?");
    let row = sqlx::query_as::<_, Role>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Permission names attached to a role, sorted for stable output
pub async fn permission_names(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT p.name FROM role_permission rp JOIN permission p ON p.id = rp.permission_id WHERE rp.role_id = ? ORDER BY p.name",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<RoleWithPermissions> {
    if find_by_name(pool, &data.name).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Role {} already exists",
            data.name
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO role (id, name, description, level, is_system, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 0, 1, ?, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.level.unwrap_or(0))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    set_permissions(pool, id, &data.permissions).await?;

    with_permissions(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<RoleWithPermissions> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE role SET name = COALESCE(?, name), description = COALESCE(?, description), level = COALESCE(?, level), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.level)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Role {id} not found")));
    }

    if let Some(permissions) = &data.permissions {
        set_permissions(pool, id, permissions).await?;
    }

    with_permissions(pool, id).await
}

/// Replace the role's permission set with the given dotted names.
/// Unknown names are a validation error: permissions are defined first,
/// then attached.
pub async fn set_permissions(pool: &SqlitePool, role_id: i64, names: &[String]) -> RepoResult<()> {
    sqlx::query("DELETE FROM role_permission WHERE role_id = ?")
        .bind(role_id)
        .execute(pool)
        .await?;

    for name in names {
        let perm: Option<(i64,)> = sqlx::query_as("SELECT id FROM permission WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        let (permission_id,) = perm
            .ok_or_else(|| RepoError::Validation(format!("Unknown permission: {name}")))?;

        sqlx::query("INSERT INTO role_permission (role_id, permission_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(permission_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn with_permissions(pool: &SqlitePool, id: i64) -> RepoResult<RoleWithPermissions> {
    let role = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;
    let permissions = permission_names(pool, id).await?;
    Ok(RoleWithPermissions { role, permissions })
}

/// How many users reference the role, via primary role name or assignment
pub async fn usage_count(pool: &SqlitePool, id: i64, name: &str) -> RepoResult<i64> {
    let (primary,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user WHERE role_name = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;
    let (assigned,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM user_role WHERE role_id = ? AND is_active = 1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(primary + assigned)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
