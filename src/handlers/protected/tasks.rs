// GET/POST /api/tasks
// GET/PUT/PATCH/DELETE /api/tasks/:task_id

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::OrgMember;
use crate::database::models::TaskDetail;
use crate::handlers::extract::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::task_service::{TaskInput, TaskPatch};
use crate::services::TaskService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
}

/// Tasks assigned to the caller or in the caller's projects, newest first
pub async fn tasks_get(
    State(state): State<AppState>,
    member: OrgMember,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Vec<TaskDetail>> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(
        service.list_for_user(member.user_id(), query.project_id).await?,
    ))
}

pub async fn tasks_post(
    State(state): State<AppState>,
    member: OrgMember,
    ValidatedJson(body): ValidatedJson<TaskInput>,
) -> ApiResult<TaskDetail> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::created(service.create(body).await?))
}

pub async fn task_get(
    State(state): State<AppState>,
    member: OrgMember,
    Path(task_id): Path<Uuid>,
) -> ApiResult<TaskDetail> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.get(task_id).await?))
}

pub async fn task_put(
    State(state): State<AppState>,
    member: OrgMember,
    Path(task_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<TaskInput>,
) -> ApiResult<TaskDetail> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.replace(task_id, body).await?))
}

pub async fn task_patch(
    State(state): State<AppState>,
    member: OrgMember,
    Path(task_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<TaskPatch>,
) -> ApiResult<TaskDetail> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.patch(task_id, body).await?))
}

pub async fn task_delete(
    State(state): State<AppState>,
    member: OrgMember,
    Path(task_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = TaskService::new(state.pool().await?, member.org_id);
    service.delete(task_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
