use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::project::ProjectRef;
use super::task::TaskStatus;
use super::user::{Role, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub org_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub role: Role,
    pub user: UserSummary,
}

/// Task id and status, enough to compute progress on the client
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskStatusRef {
    pub id: Uuid,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamProject {
    #[serde(flatten)]
    pub project: ProjectRef,
    pub tasks: Vec<TaskStatusRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub projects: Vec<TeamProject>,
}
