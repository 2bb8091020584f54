use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::project_service::project_task_statuses;
use crate::database::models::{Organization, ProjectRef, TeamProject, UserSummary};
use crate::error::ApiError;

/// Organization with its users and its projects' task statuses
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub users: Vec<UserSummary>,
    pub projects: Vec<TeamProject>,
}

pub struct OrganizationService {
    pool: PgPool,
}

impl OrganizationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, org_id: Uuid) -> Result<Option<OrganizationDetail>, ApiError> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at, updated_at FROM organizations WHERE id = $1",
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(organization) = organization else {
            return Ok(None);
        };

        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users WHERE org_id = $1 ORDER BY email",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        let projects = sqlx::query_as::<_, ProjectRef>(
            "SELECT id, name FROM projects WHERE org_id = $1 ORDER BY created_at DESC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let mut statuses = project_task_statuses(&self.pool, &ids).await?;

        Ok(Some(OrganizationDetail {
            organization,
            users,
            projects: projects
                .into_iter()
                .map(|project| TeamProject {
                    tasks: statuses.remove(&project.id).unwrap_or_default(),
                    project,
                })
                .collect(),
        }))
    }
}
