// GET/PUT /api/user/profile
// GET/PUT /api/user/theme

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{normalize_email, not_blank, password_or_empty};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::{Profile, ThemePreference};
use crate::services::UserService;
use crate::state::AppState;

/// bcrypt cost for passwords changed from the profile page
const PROFILE_PASSWORD_COST: u32 = 12;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[validate(custom = "not_blank")]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub current_password: Option<String>,
    /// Empty means unchanged
    #[validate(custom = "password_or_empty")]
    pub new_password: Option<String>,
}

pub async fn profile_get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Profile> {
    let service = UserService::new(state.pool().await?);
    Ok(ApiResponse::success(service.profile(identity.id).await?))
}

/// Update name and email. Changing the password requires the current one.
pub async fn profile_put(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdateProfile>,
) -> ApiResult<Profile> {
    let name = body.name.as_deref().map(str::trim);
    let email = body.email.as_deref().map(normalize_email);

    let password_hash = match body.new_password.as_deref().filter(|p| !p.is_empty()) {
        None => None,
        Some(new_password) => {
            let current = body.current_password.as_deref().ok_or_else(|| {
                ApiError::invalid_field("currentPassword", "Current password is required")
            })?;

            let user = state
                .directory
                .find_user_by_id(identity.id)
                .await?
                .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
            if !verify_password(current, &user.password_hash).await? {
                tracing::warn!(
                    "Password change rejected for user {}: wrong current password",
                    identity.id
                );
                return Err(ApiError::bad_request("Current password is incorrect"));
            }
            Some(hash_password(new_password, PROFILE_PASSWORD_COST).await?)
        }
    };

    let service = UserService::new(state.pool().await?);
    let profile = service
        .update_profile(identity.id, name, email.as_deref(), password_hash.as_deref())
        .await?;
    Ok(ApiResponse::success(profile))
}

pub async fn theme_get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<ThemePreference> {
    let service = UserService::new(state.pool().await?);
    Ok(ApiResponse::success(service.theme(identity.id).await?))
}

pub async fn theme_put(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(body): ValidatedJson<ThemePreference>,
) -> ApiResult<ThemePreference> {
    let service = UserService::new(state.pool().await?);
    Ok(ApiResponse::success(service.set_theme(identity.id, body).await?))
}
