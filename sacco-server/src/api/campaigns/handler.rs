//! Campaign API Handlers
//!
//! Thin shims over the dispatcher and campaign repository; every
//! lifecycle rule lives below this layer.

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{
    PERM_CAMPAIGNS_MANAGE, PERM_CAMPAIGNS_SEND, PERM_CAMPAIGNS_VIEW, PERM_MESSAGES_VIEW,
};
use crate::core::ServerState;
use crate::db::repository::{campaign, contact_group, message};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SMS_BODY_LEN, validate_required_text};
use shared::models::{Campaign, CampaignCreate, CampaignStatus, CampaignUpdate, DispatchAck, Message, TargetType};
use shared::{AppError, ErrorCode};

/// GET /api/campaigns - 获取所有群发任务
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Campaign>>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_VIEW).await?;
    let campaigns = campaign::find_all(&state.pool).await?;
    Ok(Json(campaigns))
}

/// GET /api/campaigns/:id - 获取单个群发任务
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Campaign>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_VIEW).await?;
    let found = campaign::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::CampaignNotFound, format!("Campaign {id} not found"))
        })?;
    Ok(Json(found))
}

/// POST /api/campaigns - 创建群发任务（初始为 draft）
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CampaignCreate>,
) -> AppResult<Json<Campaign>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_MANAGE).await?;

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.body, "body", MAX_SMS_BODY_LEN)?;
    validate_target(&state, payload.target_type, payload.group_id).await?;

    let created = campaign::create(&state.pool, payload, Some(current_user.id)).await?;

    state
        .audit_service
        .log(
            AuditAction::CampaignCreated,
            "campaign",
            created.id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": created.name}),
        )
        .await;

    Ok(Json(created))
}

/// PUT /api/campaigns/:id - 更新群发任务（仅 draft）
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CampaignUpdate>,
) -> AppResult<Json<Campaign>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_MANAGE).await?;

    let existing = campaign::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::CampaignNotFound, format!("Campaign {id} not found"))
        })?;
    if existing.status != CampaignStatus::Draft {
        return Err(AppError::with_message(
            ErrorCode::CampaignInvalidState,
            format!("Campaign {id} is {}, only drafts can be edited", existing.status),
        ));
    }

    if let Some(body) = &payload.body {
        validate_required_text(body, "body", MAX_SMS_BODY_LEN)?;
    }
    let target_type = payload.target_type.unwrap_or(existing.target_type);
    let group_id = payload.group_id.or(existing.group_id);
    validate_target(&state, target_type, group_id).await?;

    let updated = campaign::update(&state.pool, id, payload).await?;

    state
        .audit_service
        .log(
            AuditAction::CampaignUpdated,
            "campaign",
            id.to_string(),
            Some(current_user.id),
            Some(current_user.display_name.clone()),
            serde_json::json!({"name": updated.name}),
        )
        .await;

    Ok(Json(updated))
}

/// POST /api/campaigns/:id/send - 启动群发
///
/// Synchronous handshake: returns the recipient count and `sending`;
/// the paced per-recipient loop continues in the background.
pub async fn send(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<DispatchAck>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_SEND).await?;
    let ack = state.dispatcher().send_campaign(id).await?;
    Ok(Json(ack))
}

/// POST /api/campaigns/:id/cancel - 取消群发（仅 draft/scheduled）
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Campaign>> {
    state.resolver().authorize(current_user.id, PERM_CAMPAIGNS_MANAGE).await?;
    let cancelled = state.dispatcher().cancel_campaign(id).await?;
    Ok(Json(cancelled))
}

/// GET /api/campaigns/:id/messages - 逐条发送记录
pub async fn messages(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Message>>> {
    state.resolver().authorize(current_user.id, PERM_MESSAGES_VIEW).await?;

    campaign::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::CampaignNotFound, format!("Campaign {id} not found"))
        })?;

    let messages = message::find_by_campaign(&state.pool, id).await?;
    Ok(Json(messages))
}

/// specific_group 必须携带存在的组；其余目标不得携带组
async fn validate_target(
    state: &ServerState,
    target_type: TargetType,
    group_id: Option<i64>,
) -> AppResult<()> {
    match target_type {
        TargetType::SpecificGroup => {
            let group_id = group_id.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::CampaignTargetInvalid,
                    "specific_group campaigns require group_id",
                )
            })?;
            contact_group::find_by_id(&state.pool, group_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::GroupNotFound,
                        format!("Contact group {group_id} not found"),
                    )
                })?;
            Ok(())
        }
        TargetType::AllMembers => Ok(()),
        TargetType::CustomList => Err(AppError::with_message(
            ErrorCode::CampaignTargetInvalid,
            "custom_list campaigns are not accepted by this endpoint",
        )),
    }
}
