//! Permission API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{PERM_PERMISSIONS_MANAGE, PERM_ROLES_VIEW};
use crate::core::ServerState;
use crate::db::repository::permission;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use shared::models::{Permission, PermissionCreate};
use shared::{AppError, ErrorCode};

/// GET /api/permissions - 获取所有权限定义
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Permission>>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_VIEW).await?;
    let permissions = permission::find_all(&state.pool).await?;
    Ok(Json(permissions))
}

/// GET /api/permissions/:id - 获取单个权限定义
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Permission>> {
    state.resolver().authorize(current_user.id, PERM_ROLES_VIEW).await?;
    let found = permission::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PermissionNotFound,
                format!("Permission {id} not found"),
            )
        })?;
    Ok(Json(found))
}

/// POST /api/permissions - 定义新权限
///
/// The dotted name is derived from the (module, resource, action) triple.
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<PermissionCreate>,
) -> AppResult<Json<Permission>> {
    state
        .resolver()
        .authorize(current_user.id, PERM_PERMISSIONS_MANAGE)
        .await?;

    validate_required_text(&payload.module, "module", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.resource, "resource", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.action, "action", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    for (value, field) in [
        (&payload.module, "module"),
        (&payload.resource, "resource"),
        (&payload.action, "action"),
    ] {
        if value.contains('.') {
            return Err(AppError::validation(format!(
                "{field} must not contain '.' (it is the name separator)"
            )));
        }
    }

    let created = permission::create(&state.pool, payload, false).await?;

    state
        .audit_service
        .log(
            AuditAction::PermissionCreated,
            "permission",
            created.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": created.name}),
        )
        .await;

    Ok(Json(created))
}

/// DELETE /api/permissions/:id - 删除权限定义
///
/// System permissions and permissions still referenced by a role are
/// refused.
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state
        .resolver()
        .authorize(current_user.id, PERM_PERMISSIONS_MANAGE)
        .await?;

    let existing = permission::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PermissionNotFound,
                format!("Permission {id} not found"),
            )
        })?;

    if existing.is_system {
        return Err(AppError::with_message(
            ErrorCode::PermissionIsSystem,
            format!("System permission {} cannot be deleted", existing.name),
        ));
    }

    let references = permission::reference_count(&state.pool, id).await?;
    if references > 0 {
        return Err(AppError::with_message(
            ErrorCode::PermissionInUse,
            format!(
                "Permission {} is referenced by {references} role(s)",
                existing.name
            ),
        ));
    }

    let result = permission::delete(&state.pool, id).await?;

    if result {
        state
            .audit_service
            .log(
                AuditAction::PermissionDeleted,
                "permission",
                id.to_string(),
                Some(current_user.id),
                Some(current_user.display_name.clone()),
                serde_json::json!({"name": existing.name}),
            )
            .await;
    }

    Ok(Json(result))
}
