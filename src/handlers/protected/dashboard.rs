// GET /api/dashboard
// GET /api/analytics

use axum::extract::State;
use chrono::Utc;

use crate::auth::OrgMember;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::analytics_service::Analytics;
use crate::services::dashboard_service::Dashboard;
use crate::services::{AnalyticsService, DashboardService};
use crate::state::AppState;

pub async fn dashboard_get(
    State(state): State<AppState>,
    member: OrgMember,
) -> ApiResult<Dashboard> {
    let service = DashboardService::new(state.pool().await?, member.org_id);
    let dashboard = service.build(member.user_id(), Utc::now()).await?;
    Ok(ApiResponse::success(dashboard).cached_privately())
}

pub async fn analytics_get(
    State(state): State<AppState>,
    member: OrgMember,
) -> ApiResult<Analytics> {
    let service = AnalyticsService::new(state.pool().await?, member.org_id);
    Ok(ApiResponse::success(service.build().await?).cached_privately())
}
