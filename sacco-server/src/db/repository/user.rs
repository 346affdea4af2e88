//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserCreate, UserUpdate};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, username, display_name, email, phone, password_hash, role_name, is_super_admin, is_active, created_at, updated_at FROM user";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let sql = format!("{USER_SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE username = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Insert a user. `password_hash` is produced by the auth layer; raw
/// passwords never reach the repository.
pub async fn create(pool: &SqlitePool, data: UserCreate, password_hash: &str) -> RepoResult<User> {
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Username {} already exists",
            data.username
        )));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO user (id, username, display_name, email, phone, password_hash, role_name, is_super_admin, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&data.display_name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(password_hash)
    .bind(&data.role_name)
    .bind(data.is_super_admin)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: UserUpdate,
    password_hash: Option<String>,
) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE user SET display_name = COALESCE(?, display_name), email = COALESCE(?, email), phone = COALESCE(?, phone), password_hash = COALESCE(?, password_hash), role_name = COALESCE(?, role_name), is_super_admin = COALESCE(?, is_super_admin), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(&data.display_name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&password_hash)
    .bind(&data.role_name)
    .bind(data.is_super_admin)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Soft-deactivate; user rows are never physically deleted.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE user SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
