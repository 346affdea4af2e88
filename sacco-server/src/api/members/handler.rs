//! Member API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{PERM_MEMBERS_MANAGE, PERM_MEMBERS_VIEW};
use crate::core::ServerState;
use crate::db::repository::member;
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use shared::models::{Member, MemberCreate, MemberUpdate};
use shared::{AppError, ErrorCode};

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/members - 获取所有社员
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Member>>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_VIEW).await?;
    let members = member::find_all(&state.pool).await?;
    Ok(Json(members))
}

/// GET /api/members/search?q=xxx - 搜索社员
pub async fn search(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Member>>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_VIEW).await?;
    let members = member::search(&state.pool, &query.q).await?;
    Ok(Json(members))
}

/// GET /api/members/:id - 获取单个社员
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Member>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_VIEW).await?;
    let found = member::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::MemberNotFound, format!("Member {id} not found"))
        })?;
    Ok(Json(found))
}

/// POST /api/members - 创建社员
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<MemberCreate>,
) -> AppResult<Json<Member>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_MANAGE).await?;

    validate_required_text(&payload.member_no, "member_no", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let created = member::create(&state.pool, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::MemberCreated,
            "member",
            created.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"member_no": created.member_no, "name": created.name}),
        )
        .await;

    Ok(Json(created))
}

/// PUT /api/members/:id - 更新社员
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<MemberUpdate>,
) -> AppResult<Json<Member>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_MANAGE).await?;

    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let updated = member::update(&state.pool, id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::MemberUpdated,
            "member",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"member_no": updated.member_no}),
        )
        .await;

    Ok(Json(updated))
}

/// DELETE /api/members/:id - 删除社员（软删除）
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.resolver().authorize(current_user.id, PERM_MEMBERS_MANAGE).await?;

    let result = member::delete(&state.pool, id).await?;

    if result {
        state
            .audit_service
            .log(
                AuditAction::MemberDeleted,
                "member",
                id.to_string(),
                Some(current_user.id),
                Some(current_user.display_name.clone()),
                serde_json::json!({}),
            )
            .await;
    }

    Ok(Json(result))
}
