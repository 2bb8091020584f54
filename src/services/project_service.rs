use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{Priority, Project, ProjectStatus, TaskStatusRef, UserSummary};
use crate::error::ApiError;
use crate::handlers::utils::not_blank;

const PROJECT_COLUMNS: &str = r#"
    p.id, p.name, p.description, p.start_date, p.end_date, p.status, p.priority,
    p.org_id, p.created_at, p.updated_at
"#;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(custom = "not_blank")]
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: ProjectStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[validate(custom = "not_blank")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Active
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// Row of the organization project list
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListing {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub teams: Vec<Uuid>,
}

/// Project with its members and task statuses
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub users: Vec<UserSummary>,
    pub tasks: Vec<TaskStatusRef>,
}

#[derive(FromRow)]
struct TeamLink {
    project_id: Uuid,
    team_id: Uuid,
}

#[derive(FromRow)]
struct MemberRow {
    project_id: Uuid,
    #[sqlx(flatten)]
    user: UserSummary,
}

#[derive(FromRow)]
struct TaskStatusRow {
    project_id: Uuid,
    #[sqlx(flatten)]
    task: TaskStatusRef,
}

/// Projects within one organization
pub struct ProjectService {
    pool: PgPool,
    org_id: Uuid,
}

impl ProjectService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    pub async fn list(&self) -> Result<Vec<ProjectListing>, ApiError> {
        let projects: Vec<(Uuid, String, Option<String>)> = sqlx::query_as(
            "SELECT id, name, description FROM projects WHERE org_id = $1 ORDER BY created_at DESC",
        )
        .bind(self.org_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = projects.iter().map(|(id, _, _)| *id).collect();
        let mut teams: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in sqlx::query_as::<_, TeamLink>(
            "SELECT project_id, team_id FROM team_projects WHERE project_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?
        {
            teams.entry(link.project_id).or_default().push(link.team_id);
        }

        Ok(projects
            .into_iter()
            .map(|(id, name, description)| ProjectListing {
                teams: teams.remove(&id).unwrap_or_default(),
                id,
                name,
                description,
            })
            .collect())
    }

    /// Create a project; the creator becomes its first member
    pub async fn create(
        &self,
        creator_id: Uuid,
        input: NewProject,
    ) -> Result<ProjectDetail, ApiError> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (id, name, description, start_date, end_date, status, priority, org_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, description, start_date, end_date, status, priority,
                      org_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.status)
        .bind(input.priority)
        .bind(self.org_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO project_users (project_id, user_id) VALUES ($1, $2)")
            .bind(project.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Created project {} in organization {}", project.id, self.org_id);

        self.detail(project).await
    }

    /// Only projects `user_id` is a member of are visible
    pub async fn get_for_member(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectDetail, ApiError> {
        let project = self.find_for_member(user_id, project_id).await?;
        self.detail(project).await
    }

    pub async fn update_for_member(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        patch: ProjectPatch,
    ) -> Result<ProjectDetail, ApiError> {
        self.find_for_member(user_id, project_id).await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, start_date, end_date, status, priority,
                      org_id, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.status)
        .bind(patch.priority)
        .fetch_one(&self.pool)
        .await?;

        self.detail(project).await
    }

    /// Whether a project with this id belongs to the organization
    pub async fn exists(&self, project_id: Uuid) -> Result<bool, ApiError> {
        let found: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND org_id = $2")
                .bind(project_id)
                .bind(self.org_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn find_for_member(&self, user_id: Uuid, project_id: Uuid) -> Result<Project, ApiError> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            JOIN project_users pu ON pu.project_id = p.id AND pu.user_id = $2
            WHERE p.id = $1 AND p.org_id = $3
            "#
        ))
        .bind(project_id)
        .bind(user_id)
        .bind(self.org_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    async fn detail(&self, project: Project) -> Result<ProjectDetail, ApiError> {
        let ids = [project.id];
        let users = project_members(&self.pool, &ids)
            .await?
            .remove(&project.id)
            .unwrap_or_default();
        let tasks = project_task_statuses(&self.pool, &ids)
            .await?
            .remove(&project.id)
            .unwrap_or_default();

        Ok(ProjectDetail { project, users, tasks })
    }
}

/// Members of each project, keyed by project id
pub(crate) async fn project_members(
    pool: &PgPool,
    project_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<UserSummary>>, ApiError> {
    let rows = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT pu.project_id, u.id, u.name, u.email
        FROM project_users pu JOIN users u ON u.id = pu.user_id
        WHERE pu.project_id = ANY($1)
        ORDER BY u.email
        "#,
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await?;

    let mut members: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
    for row in rows {
        members.entry(row.project_id).or_default().push(row.user);
    }
    Ok(members)
}

/// Task id and status for each project, keyed by project id
pub(crate) async fn project_task_statuses(
    pool: &PgPool,
    project_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<TaskStatusRef>>, ApiError> {
    let rows = sqlx::query_as::<_, TaskStatusRow>(
        "SELECT project_id, id, status FROM tasks WHERE project_id = ANY($1) ORDER BY created_at",
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await?;

    let mut statuses: HashMap<Uuid, Vec<TaskStatusRef>> = HashMap::new();
    for row in rows {
        statuses.entry(row.project_id).or_default().push(row.task);
    }
    Ok(statuses)
}
