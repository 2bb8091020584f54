// GET/POST /api/projects
// GET/PATCH /api/projects/:project_id

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::auth::OrgMember;
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::project_service::{NewProject, ProjectDetail, ProjectListing, ProjectPatch};
use crate::services::ProjectService;
use crate::state::AppState;

pub async fn projects_get(
    State(state): State<AppState>,
    member: OrgMember,
) -> ApiResult<Vec<ProjectListing>> {
    let service = ProjectService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.list().await?))
}

pub async fn projects_post(
    State(state): State<AppState>,
    member: OrgMember,
    ValidatedJson(body): ValidatedJson<NewProject>,
) -> ApiResult<ProjectDetail> {
    if let (Some(start), Some(end)) = (body.start_date, body.end_date) {
        if end < start {
            return Err(ApiError::invalid_field(
                "endDate",
                "End date must not be before start date",
            ));
        }
    }

    let service = ProjectService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::created(service.create(member.user_id(), body).await?))
}

pub async fn project_get(
    State(state): State<AppState>,
    member: OrgMember,
    Path(project_id): Path<Uuid>,
) -> ApiResult<ProjectDetail> {
    let service = ProjectService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.get_for_member(member.user_id(), project_id).await?))
}

pub async fn project_patch(
    State(state): State<AppState>,
    member: OrgMember,
    Path(project_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ProjectPatch>,
) -> ApiResult<ProjectDetail> {
    let service = ProjectService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(
        service.update_for_member(member.user_id(), project_id, body).await?,
    ))
}
