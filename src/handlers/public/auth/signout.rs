// POST /api/auth/signout

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::handlers::utils::set_cookie;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// Clear the session cookie. Succeeds with or without a session.
pub async fn signout_post(State(state): State<AppState>) -> impl IntoResponse {
    (
        set_cookie(state.sessions.clear_session()),
        ApiResponse::success(json!({ "message": "Signed out" })),
    )
}
