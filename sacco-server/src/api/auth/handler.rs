//! Authentication Handlers
//!
//! Handles login and current-user introspection

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::AppError;
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;

// Re-use shared DTOs for API consistency
use shared::client::{LoginRequest, LoginResponse, UserInfo};
use shared::models::EffectivePermissions;

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/login - 登录
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.clone();

    let account = user::find_by_username(&state.pool, &username)
        .await
        .map_err(AppError::from)?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message prevents username enumeration
    let account = match account {
        Some(a) => {
            if !a.is_active {
                return Err(AppError::with_message(
                    shared::ErrorCode::AccountDisabled,
                    "Account has been disabled",
                ));
            }

            let password_valid = crate::auth::password::verify_password(
                &req.password,
                &a.password_hash,
            )
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

            if !password_valid {
                state
                    .audit_service
                    .log(
                        AuditAction::LoginFailed,
                        "auth",
                        format!("user:{username}"),
                        None,
                        None,
                        serde_json::json!({"reason": "invalid_credentials"}),
                    )
                    .await;
                tracing::warn!(username = %username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            a
        }
        None => {
            state
                .audit_service
                .log(
                    AuditAction::LoginFailed,
                    "auth",
                    format!("user:{username}"),
                    None,
                    None,
                    serde_json::json!({"reason": "user_not_found"}),
                )
                .await;
            tracing::warn!(username = %username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = state
        .jwt_service()
        .generate_token(&account)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    state
        .audit_service
        .log(
            AuditAction::LoginSuccess,
            "auth",
            format!("user:{}", account.id),
            Some(account.id),
            Some(account.display_name.clone()),
            serde_json::json!({}),
        )
        .await;

    tracing::info!(username = %account.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            id: account.id,
            username: account.username,
            display_name: account.display_name,
            role: account.role_name,
            is_super_admin: account.is_super_admin,
        },
    }))
}

/// GET /api/auth/me - 当前用户信息与有效权限
#[derive(serde::Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    #[serde(flatten)]
    pub effective: EffectivePermissions,
}

pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<MeResponse>, AppError> {
    let effective = state
        .resolver()
        .get_effective_permissions(current_user.id)
        .await?;

    Ok(Json(MeResponse {
        id: current_user.id,
        username: current_user.username,
        display_name: current_user.display_name,
        role: current_user.role,
        effective,
    }))
}
