//! Permission Repository

use super::{RepoError, RepoResult};
use shared::models::{Permission, PermissionCreate, permission_name};
use sqlx::SqlitePool;

const PERMISSION_SELECT: &str =
    "SELECT id, module, resource, action, name, description, is_system, created_at FROM permission";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Permission>> {
    let sql = format!("{PERMISSION_SELECT} ORDER BY name ASC");
    let rows = sqlx::query_as::<_, Permission>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Permission>> {
    let sql = format!("{PERMISSION_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Permission>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Permission>> {
    let sql = format!("{PERMISSION_SELECT} WHERE name = ?");
    let row = sqlx::query_as::<_, Permission>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM permission")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn create(
    pool: &SqlitePool,
    data: PermissionCreate,
    is_system: bool,
) -> RepoResult<Permission> {
    let name = permission_name(&data.module, &data.resource, &data.action);
    if find_by_name(pool, &name).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Permission {name} already exists"
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO permission (id, module, resource, action, name, description, is_system, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.module)
    .bind(&data.resource)
    .bind(&data.action)
    .bind(&name)
    .bind(&data.description)
    .bind(is_system)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create permission".into()))
}

/// Number of roles referencing the permission
pub async fn reference_count(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let (n,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM role_permission WHERE permission_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(n)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM permission WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
