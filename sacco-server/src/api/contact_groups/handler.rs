//! Contact Group API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{PERM_GROUPS_MANAGE, PERM_GROUPS_VIEW};
use crate::core::ServerState;
use crate::db::repository::{contact_group, member};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use shared::models::{ContactGroup, ContactGroupCreate, ContactGroupUpdate, GroupMembersAdd};
use shared::{AppError, ErrorCode};

/// GET /api/contact-groups - 获取所有通讯组
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<ContactGroup>>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_VIEW).await?;
    let groups = contact_group::find_all(&state.pool).await?;
    Ok(Json(groups))
}

/// GET /api/contact-groups/:id - 获取单个通讯组
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ContactGroup>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_VIEW).await?;
    let found = contact_group::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::GroupNotFound, format!("Contact group {id} not found"))
        })?;
    Ok(Json(found))
}

/// POST /api/contact-groups - 创建通讯组
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ContactGroupCreate>,
) -> AppResult<Json<ContactGroup>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_MANAGE).await?;

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let created = contact_group::create(&state.pool, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::GroupCreated,
            "contact_group",
            created.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": created.name}),
        )
        .await;

    Ok(Json(created))
}

/// PUT /api/contact-groups/:id - 更新通讯组
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ContactGroupUpdate>,
) -> AppResult<Json<ContactGroup>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_MANAGE).await?;

    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let updated = contact_group::update(&state.pool, id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::GroupUpdated,
            "contact_group",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": updated.name}),
        )
        .await;

    Ok(Json(updated))
}

/// DELETE /api/contact-groups/:id - 删除通讯组（软删除）
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_MANAGE).await?;

    let result = contact_group::delete(&state.pool, id).await?;

    if result {
        state
            .audit_service
            .log(
                AuditAction::GroupDeleted,
                "contact_group",
                id.to_string(),
                Some(current_user.id),
                Some(current_user.display_name.clone()),
                serde_json::json!({}),
            )
            .await;
    }

    Ok(Json(result))
}

// ── Group membership ────────────────────────────────────────────────

/// POST /api/contact-groups/:id/members - 批量加入社员
///
/// Returns the refreshed member count.
pub async fn add_members(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<GroupMembersAdd>,
) -> AppResult<Json<i64>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_MANAGE).await?;

    if payload.member_ids.is_empty() {
        return Err(AppError::validation("member_ids must not be empty"));
    }

    contact_group::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::GroupNotFound, format!("Contact group {id} not found"))
        })?;

    // Every referenced member must exist and be active
    for member_id in &payload.member_ids {
        let m = member::find_by_id(&state.pool, *member_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::MemberNotFound,
                    format!("Member {member_id} not found"),
                )
            })?;
        if !m.is_active {
            return Err(AppError::with_message(
                ErrorCode::MemberInactive,
                format!("Member {member_id} is inactive"),
            ));
        }
    }

    let count = contact_group::add_members(&state.pool, id, &payload.member_ids).await?;

    state
        .audit_service
        .log(
            AuditAction::GroupUpdated,
            "contact_group",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"added": payload.member_ids.len(), "member_count": count}),
        )
        .await;

    Ok(Json(count))
}

/// DELETE /api/contact-groups/:id/members/:member_id - 移出社员
pub async fn remove_member(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path((id, member_id)): Path<(i64, i64)>,
) -> AppResult<Json<i64>> {
    state.resolver().authorize(current_user.id, PERM_GROUPS_MANAGE).await?;

    let count = contact_group::remove_member(&state.pool, id, member_id).await?;

    state
        .audit_service
        .log(
            AuditAction::GroupUpdated,
            "contact_group",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"removed": member_id, "member_count": count}),
        )
        .await;

    Ok(Json(count))
}
