//! Audit API Handlers

use axum::{
    Json,
    extract::{Extension, Query, State},
};

use crate::audit::{AuditChainVerification, AuditListResponse, AuditQuery, AuditStorage};
use crate::auth::CurrentUser;
use crate::auth::permissions::PERM_AUDIT_VIEW;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/audit - 审计日志列表（过滤分页）
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    state.resolver().authorize(current_user.id, PERM_AUDIT_VIEW).await?;

    let storage = AuditStorage::new(state.pool.clone());
    let response = storage
        .list(&query)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(response))
}

/// GET /api/audit/verify - 验证哈希链完整性
pub async fn verify(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<AuditChainVerification>> {
    state.resolver().authorize(current_user.id, PERM_AUDIT_VIEW).await?;

    let storage = AuditStorage::new(state.pool.clone());
    let verification = storage
        .verify_chain()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(verification))
}
