// GET/POST /api/organizations

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{CurrentUser, SessionLifetime};
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{not_blank, set_cookie};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::organization_service::OrganizationDetail;
use crate::services::OrganizationService;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganization {
    #[validate(custom = "not_blank")]
    pub name: String,
}

/// The caller's organization, or `null` while they have none
pub async fn organization_get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Option<OrganizationDetail>> {
    let Some(org_id) = identity.org_id else {
        return Ok(ApiResponse::success(None));
    };

    let service = OrganizationService::new(state.pool().await?);
    Ok(ApiResponse::success(service.get(org_id).await?))
}

/// Create an organization with the caller as its admin.
///
/// The insert and the caller's link to it happen in one transaction. The
/// session cookie is reissued so the token snapshot carries the new `orgId`.
pub async fn organization_post(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(body): ValidatedJson<CreateOrganization>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.trim();

    let organization = state.directory.create_organization(identity.id, name).await?;
    tracing::info!("User {} created organization {}", identity.id, organization.id);

    let user = state
        .directory
        .find_user_by_id(identity.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    let cookie = state.sessions.create_session(&user, SessionLifetime::Standard)?;

    Ok((set_cookie(cookie), ApiResponse::created(organization)))
}
