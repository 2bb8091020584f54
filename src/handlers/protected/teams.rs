// GET/POST /api/teams
// POST/PUT/DELETE /api/teams/:team_id/members
// POST /api/teams/:team_id/projects
// DELETE /api/teams/:team_id/projects/:project_id
//
// Member and project changes require the caller to be a team ADMIN.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::OrgMember;
use crate::database::models::{TeamDetail, TeamMember};
use crate::error::ApiError;
use crate::handlers::extract::ValidatedJson;
use crate::handlers::utils::normalize_email;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::team_service::{AddMember, NewTeam, UpdateMember};
use crate::services::TeamService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignProject {
    pub project_id: Uuid,
}

pub async fn teams_get(
    State(state): State<AppState>,
    member: OrgMember,
) -> ApiResult<Vec<TeamDetail>> {
    let service = TeamService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.list().await?))
}

pub async fn teams_post(
    State(state): State<AppState>,
    member: OrgMember,
    ValidatedJson(mut body): ValidatedJson<NewTeam>,
) -> ApiResult<TeamDetail> {
    body.name = body.name.trim().to_string();
    let service = TeamService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::created(service.create(member.user_id(), body).await?))
}

pub async fn team_members_post(
    State(state): State<AppState>,
    member: OrgMember,
    Path(team_id): Path<Uuid>,
    ValidatedJson(mut body): ValidatedJson<AddMember>,
) -> ApiResult<TeamMember> {
    body.email = normalize_email(&body.email);
    let service = TeamService::new(state.pool().await?, member.org_id);
    service.require_team_admin(team_id, member.user_id()).await?;
    Ok(ApiResponse::created(service.add_member(team_id, body).await?))
}

pub async fn team_members_put(
    State(state): State<AppState>,
    member: OrgMember,
    Path(team_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateMember>,
) -> ApiResult<TeamMember> {
    let service = TeamService::new(state.pool().await?, member.org_id);
    service.require_team_admin(team_id, member.user_id()).await?;
    Ok(ApiResponse::success(service.update_member(team_id, body).await?))
}

pub async fn team_members_delete(
    State(state): State<AppState>,
    member: OrgMember,
    Path(team_id): Path<Uuid>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<()> {
    let member_id = query
        .member_id
        .ok_or_else(|| ApiError::bad_request("Member ID is required"))?;

    let service = TeamService::new(state.pool().await?, member.org_id);
    service.require_team_admin(team_id, member.user_id()).await?;
    service.remove_member(team_id, member_id).await?;
    Ok(ApiResponse::<()>::no_content())
}

pub async fn team_projects_post(
    State(state): State<AppState>,
    member: OrgMember,
    Path(team_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AssignProject>,
) -> ApiResult<TeamDetail> {
    let service = TeamService::new(state.pool().await?, member.org_id);
    service.require_team_admin(team_id, member.user_id()).await?;
    Ok(ApiResponse::success(service.assign_project(team_id, body.project_id).await?))
}

pub async fn team_project_delete(
    State(state): State<AppState>,
    member: OrgMember,
    Path((team_id, project_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<TeamDetail> {
    let service = TeamService::new(state.pool().await?, member.org_id);
    service.require_team_admin(team_id, member.user_id()).await?;
    Ok(ApiResponse::success(service.unassign_project(team_id, project_id).await?))
}
