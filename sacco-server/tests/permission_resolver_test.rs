//! Permission resolver integration tests
//!
//! Runs against a real SQLite database in a temp directory: seeding is
//! skipped, every test builds exactly the users/roles/assignments it needs.

use sacco_server::auth::PermissionResolver;
use sacco_server::db::DbService;
use sacco_server::db::repository::{assignment, permission, role};
use shared::ErrorCode;
use shared::models::{PermissionCreate, RoleCreate, RoleUpdate};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.db");
    let db = DbService::new(path.to_str().unwrap())
        .await
        .expect("test database");
    (dir, db.pool)
}

async fn make_permission(pool: &SqlitePool, module: &str, resource: &str, action: &str) -> String {
    let created = permission::create(
        pool,
        PermissionCreate {
            module: module.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            description: None,
        },
        false,
    )
    .await
    .expect("create permission");
    created.name
}

async fn make_role(pool: &SqlitePool, name: &str, permissions: Vec<String>) -> i64 {
    let created = role::create(
        pool,
        RoleCreate {
            name: name.to_string(),
            description: None,
            level: Some(10),
            permissions,
        },
    )
    .await
    .expect("create role");
    created.role.id
}

async fn make_user(pool: &SqlitePool, username: &str, role_name: &str, is_super_admin: bool) -> i64 {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO user (id, username, display_name, email, phone, password_hash, role_name, is_super_admin, is_active, created_at, updated_at) VALUES (?, ?, ?, NULL, NULL, 'unused', ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(username)
    .bind(username)
    .bind(role_name)
    .bind(is_super_admin)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("insert user");
    id
}

fn hour_from_now() -> i64 {
    shared::util::now_millis() + 3_600_000
}

fn hour_ago() -> i64 {
    shared::util::now_millis() - 3_600_000
}

// ========== Super admin ==========

#[tokio::test]
async fn super_admin_is_granted_everything() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    // Primary role does not even exist; the flag alone decides
    let user_id = make_user(&pool, "root", "ghost_role", true).await;

    assert!(resolver.has_permission(user_id, "loans.applications.approve").await.unwrap());
    assert!(
        resolver
            .has_any_permission(user_id, &["a.b.c", "d.e.f"])
            .await
            .unwrap()
    );
    assert!(
        resolver
            .has_all_permissions(user_id, &["a.b.c", "d.e.f"])
            .await
            .unwrap()
    );
}

// ========== Primary role path ==========

#[tokio::test]
async fn primary_role_grants_its_permissions() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let approve = make_permission(&pool, "loans", "applications", "approve").await;
    let view = make_permission(&pool, "loans", "applications", "view").await;
    make_role(&pool, "loan_officer", vec![approve.clone(), view.clone()]).await;
    let user_id = make_user(&pool, "jane", "loan_officer", false).await;

    assert!(resolver.has_permission(user_id, &approve).await.unwrap());
    assert!(resolver.has_permission(user_id, &view).await.unwrap());
    assert!(!resolver.has_permission(user_id, "loans.applications.delete").await.unwrap());
}

#[tokio::test]
async fn permission_names_are_case_sensitive() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let approve = make_permission(&pool, "loans", "applications", "approve").await;
    make_role(&pool, "loan_officer", vec![approve]).await;
    let user_id = make_user(&pool, "jane", "loan_officer", false).await;

    assert!(!resolver.has_permission(user_id, "Loans.Applications.Approve").await.unwrap());
}

#[tokio::test]
async fn inactive_primary_role_grants_nothing() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let approve = make_permission(&pool, "loans", "applications", "approve").await;
    let role_id = make_role(&pool, "loan_officer", vec![approve.clone()]).await;
    role::update(
        &pool,
        role_id,
        RoleUpdate {
            name: None,
            description: None,
            level: None,
            permissions: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();

    let user_id = make_user(&pool, "jane", "loan_officer", false).await;
    assert!(!resolver.has_permission(user_id, &approve).await.unwrap());
}

// ========== Assignment path ==========

#[tokio::test]
async fn assignment_grants_additional_permissions() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let view = make_permission(&pool, "members", "records", "view").await;
    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![view.clone()]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, Some(hour_from_now()), None)
        .await
        .unwrap();

    assert!(resolver.has_permission(user_id, &view).await.unwrap());
    assert!(resolver.has_permission(user_id, &audit).await.unwrap());
}

#[tokio::test]
async fn expired_assignment_never_contributes() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, Some(hour_ago()), None)
        .await
        .unwrap();

    assert!(!resolver.has_permission(user_id, &audit).await.unwrap());
    let effective = resolver.get_effective_permissions(user_id).await.unwrap();
    assert!(!effective.permissions.contains(&audit));
    assert!(!effective.roles.contains(&"auditor".to_string()));
}

#[tokio::test]
async fn revoked_assignment_never_contributes() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    let granted = assignment::create(&pool, user_id, auditor_id, None, None)
        .await
        .unwrap();
    assert!(resolver.has_permission(user_id, &audit).await.unwrap());

    assignment::revoke(&pool, user_id, granted.id).await.unwrap();
    assert!(!resolver.has_permission(user_id, &audit).await.unwrap());
}

#[tokio::test]
async fn assignment_to_inactive_role_grants_nothing() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, None, None)
        .await
        .unwrap();

    role::update(
        &pool,
        auditor_id,
        RoleUpdate {
            name: None,
            description: None,
            level: None,
            permissions: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();

    assert!(!resolver.has_permission(user_id, &audit).await.unwrap());
}

// ========== Variant semantics ==========

#[tokio::test]
async fn has_any_consults_primary_and_assignments() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let view = make_permission(&pool, "members", "records", "view").await;
    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![view.clone()]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, None, None)
        .await
        .unwrap();

    assert!(resolver.has_any_permission(user_id, &[view.as_str()]).await.unwrap());
    assert!(resolver.has_any_permission(user_id, &[audit.as_str()]).await.unwrap());
    assert!(
        resolver
            .has_any_permission(user_id, &["no.such.permission", view.as_str()])
            .await
            .unwrap()
    );
    assert!(
        !resolver
            .has_any_permission(user_id, &["no.such.permission"])
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn has_all_ignores_the_primary_role() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let view = make_permission(&pool, "members", "records", "view").await;
    let audit = make_permission(&pool, "reports", "audit", "view").await;
    make_role(&pool, "clerk", vec![view.clone()]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, None, None)
        .await
        .unwrap();

    // Granted through the primary role, visible to has_permission...
    assert!(resolver.has_permission(user_id, &view).await.unwrap());
    // ...but has_all_permissions only sees explicit assignments
    assert!(!resolver.has_all_permissions(user_id, &[view.as_str()]).await.unwrap());
    assert!(resolver.has_all_permissions(user_id, &[audit.as_str()]).await.unwrap());
    assert!(
        !resolver
            .has_all_permissions(user_id, &[audit.as_str(), view.as_str()])
            .await
            .unwrap()
    );
}

// ========== Effective permissions ==========

#[tokio::test]
async fn effective_permissions_are_idempotent_and_sorted() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let view = make_permission(&pool, "members", "records", "view").await;
    let audit = make_permission(&pool, "reports", "audit", "view").await;
    // Same permission on both roles: union must deduplicate
    make_role(&pool, "clerk", vec![view.clone(), audit.clone()]).await;
    let auditor_id = make_role(&pool, "auditor", vec![audit.clone()]).await;

    let user_id = make_user(&pool, "omar", "clerk", false).await;
    assignment::create(&pool, user_id, auditor_id, Some(hour_from_now()), None)
        .await
        .unwrap();

    let first = resolver.get_effective_permissions(user_id).await.unwrap();
    let second = resolver.get_effective_permissions(user_id).await.unwrap();
    assert_eq!(first, second);

    assert_eq!(first.roles, vec!["auditor".to_string(), "clerk".to_string()]);
    let mut expected = vec![view.clone(), audit.clone()];
    expected.sort();
    assert_eq!(first.permissions, expected);
}

// ========== Failure semantics ==========

#[tokio::test]
async fn missing_user_is_not_found() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    let err = resolver
        .has_permission(424242, "members.records.view")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UserNotFound);
}

#[tokio::test]
async fn authorize_denial_names_the_required_permission() {
    let (_dir, pool) = test_pool().await;
    let resolver = PermissionResolver::new(pool.clone());

    make_role(&pool, "clerk", vec![]).await;
    let user_id = make_user(&pool, "omar", "clerk", false).await;

    let err = resolver
        .authorize(user_id, "members.records.manage")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    let details = err.details.expect("denial carries details");
    assert_eq!(details.get("required").unwrap(), "members.records.manage");
}
