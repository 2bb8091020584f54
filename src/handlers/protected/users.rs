// GET/POST /api/users

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::auth::OrgMember;
use crate::database::models::{NewUser, Role};
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{normalize_email, not_blank};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::UserListing;
use crate::services::UserService;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub org_id: Option<Uuid>,
}

pub async fn users_get(
    State(state): State<AppState>,
    member: OrgMember,
) -> ApiResult<Vec<UserListing>> {
    let service = UserService::new(state.pool().await?);
    Ok(ApiResponse::success(service.list_in_organization(member.org_id).await?))
}

/// Add a user directly to the caller's organization. ADMIN only.
pub async fn users_post(
    State(state): State<AppState>,
    member: OrgMember,
    ValidatedJson(body): ValidatedJson<CreateUser>,
) -> ApiResult<CreatedUser> {
    member.require_admin()?;
    let name = body.name.trim().to_string();
    let email = normalize_email(&body.email);

    let password_hash = hash_password(&body.password, state.config.security.bcrypt_cost).await?;
    let user = state
        .directory
        .create_user(NewUser {
            email,
            name: Some(name),
            password_hash,
            role: body.role,
            org_id: Some(member.org_id),
        })
        .await?;
    tracing::info!(
        "Admin {} added user {} to organization {}",
        member.user_id(),
        user.id,
        member.org_id
    );

    Ok(ApiResponse::created(CreatedUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        org_id: user.org_id,
    }))
}
