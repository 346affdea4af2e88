//! User API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{PERM_USERS_MANAGE, PERM_USERS_VIEW};
use crate::core::ServerState;
use crate::db::repository::{assignment, role, user};
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use shared::client::{CheckMode, PermissionCheckRequest, PermissionCheckResponse};
use shared::models::{
    EffectivePermissions, RoleAssignment, RoleAssignmentCreate, RoleAssignmentWithRole, User,
    UserCreate, UserUpdate,
};
use shared::{AppError, ErrorCode};

/// GET /api/users - 获取所有用户
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<User>>> {
    state.resolver().authorize(current_user.id, PERM_USERS_VIEW).await?;
    let users = user::find_all(&state.pool).await?;
    Ok(Json(users))
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    state.resolver().authorize(current_user.id, PERM_USERS_MANAGE).await?;

    validate_required_text(&payload.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;

    // The primary role must exist before it can be named on a user
    role::find_by_name(&state.pool, &payload.role_name)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::RoleNotFound,
                format!("Role {} not found", payload.role_name),
            )
        })?;

    let password_hash = crate::auth::password::hash_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let created = user::create(&state.pool, payload, &password_hash).await?;

    state
        .audit_service
        .log(
            AuditAction::UserCreated,
            "user",
            created.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"username": created.username}),
        )
        .await;

    Ok(Json(created))
}

/// GET /api/users/:id - 获取单个用户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    // Self-inspection is always allowed
    if current_user.id != id {
        state.resolver().authorize(current_user.id, PERM_USERS_VIEW).await?;
    }

    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found")))?;
    Ok(Json(found))
}

/// PUT /api/users/:id - 更新用户（角色变更、停启用等）
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    state.resolver().authorize(current_user.id, PERM_USERS_MANAGE).await?;

    validate_optional_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.password, "password", MAX_PASSWORD_LEN)?;

    if let Some(role_name) = &payload.role_name {
        role::find_by_name(&state.pool, role_name)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::RoleNotFound,
                    format!("Role {role_name} not found"),
                )
            })?;
    }

    let password_hash = match &payload.password {
        Some(password) => Some(
            crate::auth::password::hash_password(password)
                .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?,
        ),
        None => None,
    };

    let updated = user::update(&state.pool, id, payload, password_hash).await?;

    state
        .audit_service
        .log(
            AuditAction::UserUpdated,
            "user",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"username": updated.username}),
        )
        .await;

    Ok(Json(updated))
}

/// PUT /api/users/:id/deactivate - 停用用户（软删除）
pub async fn deactivate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.resolver().authorize(current_user.id, PERM_USERS_MANAGE).await?;

    if current_user.id == id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf));
    }

    let result = user::deactivate(&state.pool, id).await?;

    if result {
        state
            .audit_service
            .log(
                AuditAction::UserUpdated,
                "user",
                id.to_string(),
                Some(current_user.id),
                Some(current_user.display_name.clone()),
                serde_json::json!({"is_active": false}),
            )
            .await;
    }

    Ok(Json(result))
}

// ── Explicit role assignments ───────────────────────────────────────

/// GET /api/users/:id/assignments - 用户的显式角色授权
pub async fn list_assignments(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<RoleAssignmentWithRole>>> {
    if current_user.id != id {
        state.resolver().authorize(current_user.id, PERM_USERS_VIEW).await?;
    }
    let assignments = assignment::find_by_user(&state.pool, id).await?;
    Ok(Json(assignments))
}

/// POST /api/users/:id/assignments - 授予角色（可设过期时间）
pub async fn assign_role(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleAssignmentCreate>,
) -> AppResult<Json<RoleAssignment>> {
    state.resolver().authorize(current_user.id, PERM_USERS_MANAGE).await?;

    user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found")))?;
    let granted_role = role::find_by_id(&state.pool, payload.role_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::RoleNotFound,
                format!("Role {} not found", payload.role_id),
            )
        })?;

    if let Some(expires_at) = payload.expires_at
        && expires_at <= shared::util::now_millis()
    {
        return Err(AppError::validation("expires_at must be in the future"));
    }

    let created = assignment::create(
        &state.pool,
        id,
        payload.role_id,
        payload.expires_at,
        Some(current_user.id),
    )
    .await?;

    state
        .audit_service
        .log(
            AuditAction::RoleAssigned,
            "user",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"role": granted_role.name, "expires_at": payload.expires_at}),
        )
        .await;

    Ok(Json(created))
}

/// DELETE /api/users/:id/assignments/:assignment_id - 撤销授权
pub async fn revoke_assignment(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path((id, assignment_id)): Path<(i64, i64)>,
) -> AppResult<Json<bool>> {
    state.resolver().authorize(current_user.id, PERM_USERS_MANAGE).await?;

    let revoked = assignment::revoke(&state.pool, id, assignment_id).await?;
    if !revoked {
        return Err(AppError::with_message(
            ErrorCode::AssignmentNotFound,
            format!("Active assignment {assignment_id} not found for user {id}"),
        ));
    }

    state
        .audit_service
        .log(
            AuditAction::RoleAssignmentRevoked,
            "user",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"assignment_id": assignment_id}),
        )
        .await;

    Ok(Json(true))
}

// ── Effective permissions ───────────────────────────────────────────

/// GET /api/users/:id/permissions - 有效角色与权限集合
pub async fn effective_permissions(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<EffectivePermissions>> {
    if current_user.id != id {
        state.resolver().authorize(current_user.id, PERM_USERS_VIEW).await?;
    }
    let effective = state.resolver().get_effective_permissions(id).await?;
    Ok(Json(effective))
}

/// POST /api/users/:id/permissions/check - 权限检查（any/all）
pub async fn check_permissions(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionCheckRequest>,
) -> AppResult<Json<PermissionCheckResponse>> {
    if current_user.id != id {
        state.resolver().authorize(current_user.id, PERM_USERS_VIEW).await?;
    }

    if payload.permissions.is_empty() {
        return Err(AppError::validation("permissions must not be empty"));
    }

    let names: Vec<&str> = payload.permissions.iter().map(String::as_str).collect();
    let granted = match payload.mode {
        CheckMode::Any => state.resolver().has_any_permission(id, &names).await?,
        CheckMode::All => state.resolver().has_all_permissions(id, &names).await?,
    };

    let missing = if granted {
        Vec::new()
    } else {
        // Report which of the requested names the user does not hold
        let mut missing = Vec::new();
        for name in &names {
            if !state.resolver().has_permission(id, name).await? {
                missing.push((*name).to_string());
            }
        }
        missing
    };

    Ok(Json(PermissionCheckResponse { granted, missing }))
}
