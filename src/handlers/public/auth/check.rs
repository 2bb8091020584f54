// GET /api/auth/check

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::CurrentUser;

/// Session check for the client.
///
/// 401 `{authorized:false}` without a session; `needsOrg` for users that still
/// have to create an organization.
pub async fn check_get(user: Option<CurrentUser>) -> impl IntoResponse {
    match user {
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "authorized": false }))),
        Some(CurrentUser(identity)) if identity.org_id.is_none() => (
            StatusCode::OK,
            Json(json!({ "authorized": true, "needsOrg": true })),
        ),
        Some(CurrentUser(identity)) => (
            StatusCode::OK,
            Json(json!({ "authorized": true, "user": identity })),
        ),
    }
}
