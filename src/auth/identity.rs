use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use serde::Serialize;
use uuid::Uuid;

use super::SIGN_IN_PATH;
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Server-verified view of the caller, rebuilt for every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub org_id: Option<Uuid>,
    pub role: Role,
}

impl From<&User> for ResolvedIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            org_id: user.org_id,
            role: user.role,
        }
    }
}

impl ResolvedIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identity of the caller, or `None`.
///
/// Reuses the identity the gatekeeper already resolved for this request when
/// there is one; otherwise reads the session cookie and re-reads the user.
pub async fn auth(parts: &Parts, state: &AppState) -> Option<ResolvedIdentity> {
    if let Some(identity) = parts.extensions.get::<ResolvedIdentity>() {
        return Some(identity.clone());
    }
    state.sessions.get_session(&parts.headers).await
}

/// Like [`auth`], but sends the browser to the sign-in page when there is no identity
pub async fn require_auth(parts: &Parts, state: &AppState) -> Result<ResolvedIdentity, Redirect> {
    auth(parts, state)
        .await
        .ok_or_else(|| Redirect::temporary(SIGN_IN_PATH))
}

/// Authenticated API caller. Rejects with 401 JSON.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ResolvedIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match auth(parts, state).await {
            Some(identity) => Ok(CurrentUser(identity)),
            None => {
                tracing::debug!("Rejected unauthenticated API request to {}", parts.uri.path());
                Err(ApiError::unauthorized("Unauthorized"))
            }
        }
    }
}

/// Authenticated API caller that belongs to an organization.
///
/// Handlers scope every query by `org_id`; 401 without a session, 403 without
/// an organization.
#[derive(Debug, Clone)]
pub struct OrgMember {
    pub identity: ResolvedIdentity,
    pub org_id: Uuid,
}

impl OrgMember {
    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.identity.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Administrator role required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OrgMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        match identity.org_id {
            Some(org_id) => Ok(OrgMember { identity, org_id }),
            None => Err(ApiError::forbidden("Organization not found")),
        }
    }
}

/// Page-level identity. Redirects to the sign-in page instead of rendering.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub ResolvedIdentity);

#[async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_auth(parts, state).await.map(RequireAuth)
    }
}
