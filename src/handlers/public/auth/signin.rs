// POST /api/auth/signin

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::verify_password;
use crate::auth::{SessionLifetime, SIGN_IN_PATH};
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::extract::Submission;
use crate::handlers::utils::{normalize_email, not_blank, set_cookie};
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// Where a successful form sign-in lands
const AFTER_SIGN_IN_PATH: &str = "/dashboard";

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub org_id: Option<Uuid>,
}

/// Verify credentials and start a session.
///
/// Unknown email and wrong password are indistinguishable (401, no cookie).
/// `remember` extends the session from 24 hours to 30 days. Submissions from
/// the sign-in page's HTML form are answered with redirects instead of JSON.
pub async fn signin_post(
    State(state): State<AppState>,
    submission: Submission<SignInRequest>,
) -> Result<Response, ApiError> {
    let from_form = submission.is_form();
    let body = submission.into_inner();

    let user = match authenticate(&state, &body).await {
        Ok(user) => user,
        Err(ApiError::Unauthorized(_)) if from_form => {
            return Ok(Redirect::to(&format!("{SIGN_IN_PATH}?error=credentials")).into_response());
        }
        Err(e) => return Err(e),
    };

    let cookie = state
        .sessions
        .create_session(&user, SessionLifetime::from_remember(body.remember))?;
    tracing::info!("User {} signed in (remember: {})", user.id, body.remember);

    if from_form {
        return Ok((set_cookie(cookie), Redirect::to(AFTER_SIGN_IN_PATH)).into_response());
    }

    Ok((
        set_cookie(cookie),
        ApiResponse::success(SignedInUser {
            id: user.id,
            email: user.email,
            name: user.name,
            org_id: user.org_id,
        }),
    )
        .into_response())
}

async fn authenticate(state: &AppState, body: &SignInRequest) -> Result<User, ApiError> {
    let email = normalize_email(&body.email);

    let Some(user) = state.directory.find_user_by_email(&email).await? else {
        tracing::warn!("Sign-in rejected: unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&body.password, &user.password_hash).await? {
        tracing::warn!("Sign-in rejected: wrong password for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    Ok(user)
}
