// POST /api/auth/signup

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::auth::SessionLifetime;
use crate::database::models::{NewUser, Role};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{normalize_email, not_blank, set_cookie};
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignedUpUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// Create an account without an organization and sign it in for 24 hours
pub async fn signup_post(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim().to_string();
    let email = normalize_email(&body.email);

    let password_hash = hash_password(&body.password, state.config.security.bcrypt_cost).await?;
    let user = state
        .directory
        .create_user(NewUser {
            email,
            name: Some(name),
            password_hash,
            role: Role::Member,
            org_id: None,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(_) => ApiError::bad_request("User already exists"),
            other => other.into(),
        })?;

    let cookie = state.sessions.create_session(&user, SessionLifetime::Standard)?;
    tracing::info!("Registered user {}", user.id);

    Ok((
        set_cookie(cookie),
        ApiResponse::created(SignedUpUser {
            id: user.id,
            email: user.email,
            name: user.name,
        }),
    ))
}
