// GET/POST /api/tags
// DELETE /api/tags/:tag_id

use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::OrgMember;
use crate::database::models::Tag;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::{hex_color, not_blank};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TagService;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTag {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "hex_color")]
    pub color: String,
}

pub async fn tags_get(State(state): State<AppState>, member: OrgMember) -> ApiResult<Vec<Tag>> {
    let service = TagService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.list().await?))
}

pub async fn tags_post(
    State(state): State<AppState>,
    member: OrgMember,
    ValidatedJson(body): ValidatedJson<CreateTag>,
) -> ApiResult<Tag> {
    let service = TagService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::created(service.create(body.name.trim(), &body.color).await?))
}

pub async fn tag_delete(
    State(state): State<AppState>,
    member: OrgMember,
    Path(tag_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = TagService::new(state.pool().await?, member.org_id);
    service.delete(tag_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
