//! Role API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{PERM_ROLES_MANAGE, PERM_ROLES_VIEW};
use crate::core::ServerState;
use crate::db::repository::role;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use shared::models::{RoleCreate, RoleUpdate, RoleWithPermissions};
use shared::{AppError, ErrorCode};

/// GET /api/roles - 获取所有角色（含权限集合）
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<RoleWithPermissions>>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_VIEW).await?;

    let roles = role::find_all(&state.pool).await?;
    let mut result = Vec::with_capacity(roles.len());
    for r in roles {
        let permissions = role::permission_names(&state.pool, r.id).await?;
        result.push(RoleWithPermissions { role: r, permissions });
    }
    Ok(Json(result))
}

/// GET /api/roles/:id - 获取单个角色
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<RoleWithPermissions>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_VIEW).await?;
    let found = role::with_permissions(&state.pool, id).await?;
    Ok(Json(found))
}

/// POST /api/roles - 创建角色
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<RoleWithPermissions>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_MANAGE).await?;

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let created = role::create(&state.pool, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::RoleCreated,
            "role",
            created.role.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": created.role.name, "permissions": created.permissions}),
        )
        .await;

    Ok(Json(created))
}

/// PUT /api/roles/:id - 更新角色
///
/// System roles keep their name; everything else is editable.
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<RoleWithPermissions>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_MANAGE).await?;

    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let existing = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::RoleNotFound, format!("Role {id} not found")))?;

    if existing.is_system
        && let Some(new_name) = &payload.name
        && *new_name != existing.name
    {
        return Err(AppError::with_message(
            ErrorCode::RoleIsSystem,
            format!("System role {} cannot be renamed", existing.name),
        ));
    }

    let updated = role::update(&state.pool, id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::RoleUpdated,
            "role",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": updated.role.name, "permissions": updated.permissions}),
        )
        .await;

    Ok(Json(updated))
}

/// DELETE /api/roles/:id - 删除角色
///
/// System roles and roles still referenced by a user (primary or
/// assignment) are refused.
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_MANAGE).await?;

    let existing = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::RoleNotFound, format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(AppError::with_message(
            ErrorCode::RoleIsSystem,
            format!("System role {} cannot be deleted", existing.name),
        ));
    }

    let usage = role::usage_count(&state.pool, id, &existing.name).await?;
    if usage > 0 {
        return Err(AppError::with_message(
            ErrorCode::RoleInUse,
            format!("Role {} is referenced by {usage} user(s)", existing.name),
        ));
    }

    let result = role::delete(&state.pool, id).await?;

    if result {
        state
            .audit_service
            .log(
                AuditAction::RoleDeleted,
                "role",
                id.to_string(),
                Some(current_user.id),
                Some(current_user.display_name.clone()),
                serde_json::json!({"name": existing.name}),
            )
            .await;
    }

    Ok(Json(result))
}
