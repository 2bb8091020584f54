// POST /api/auth/reset-password
// POST /api/auth/reset-password/confirm

use axum::extract::State;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{generate_reset_token, hash_password, hash_reset_token};
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{normalize_email, not_blank};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequested {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetConfirm {
    #[validate(custom = "not_blank")]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Issue a one-hour reset token.
///
/// The response is identical for known and unknown emails. Outside production
/// the raw token is included so it can be used without a mail transport.
pub async fn reset_request_post(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetRequest>,
) -> ApiResult<ResetRequested> {
    let email = normalize_email(&body.email);
    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

    let stored = state
        .directory
        .store_reset_token(&email, &hash_reset_token(&token), expires_at)
        .await?;
    if stored {
        tracing::info!("Password reset requested");
    } else {
        tracing::debug!("Password reset requested for unknown email");
    }

    Ok(ApiResponse::success(ResetRequested {
        message: "If an account exists for that email, a reset link has been sent",
        reset_token: (stored && state.config.security.expose_reset_tokens).then_some(token),
    }))
}

pub async fn reset_confirm_post(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetConfirm>,
) -> ApiResult<serde_json::Value> {
    let token = body.token.trim();

    let password_hash = hash_password(&body.password, state.config.security.bcrypt_cost).await?;
    let reset = state
        .directory
        .reset_password(&hash_reset_token(token), &password_hash, Utc::now())
        .await?;

    if !reset {
        return Err(ApiError::bad_request("Invalid or expired reset token"));
    }

    tracing::info!("Password reset completed");
    Ok(ApiResponse::success(serde_json::json!({ "message": "Password has been reset" })))
}
