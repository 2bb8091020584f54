// GET/POST/PUT /api/time-entries

use axum::extract::{Query, State};

use crate::auth::CurrentUser;
use crate::database::models::TimeEntryDetail;
use crate::handlers::extract::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::time_entry_service::{StartEntry, TimeEntryQuery, UpdateEntry};
use crate::services::TimeEntryService;
use crate::state::AppState;

pub async fn time_entries_get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(query): Query<TimeEntryQuery>,
) -> ApiResult<Vec<TimeEntryDetail>> {
    let service = TimeEntryService::new(state.pool().await?, identity.id);
    Ok(ApiResponse::success(service.list(&query).await?))
}

pub async fn time_entries_post(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(body): ValidatedJson<StartEntry>,
) -> ApiResult<TimeEntryDetail> {
    let service = TimeEntryService::new(state.pool().await?, identity.id);
    Ok(ApiResponse::created(service.start(identity.org_id, body).await?))
}

pub async fn time_entries_put(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ValidatedJson(body): ValidatedJson<UpdateEntry>,
) -> ApiResult<TimeEntryDetail> {
    let service = TimeEntryService::new(state.pool().await?, identity.id);
    Ok(ApiResponse::success(service.update(body).await?))
}
