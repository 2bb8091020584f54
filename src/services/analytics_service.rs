use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{Priority, Project, ProjectRef, TaskStatus};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsTask {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsProject {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<AnalyticsTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub projects: Vec<AnalyticsProject>,
    pub tasks: Vec<AnalyticsTask>,
}

#[derive(FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    status: TaskStatus,
    priority: Priority,
    created_at: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    project_id: Uuid,
    project_name: String,
}

impl From<TaskRow> for AnalyticsTask {
    fn from(row: TaskRow) -> Self {
        AnalyticsTask {
            id: row.id,
            title: row.title,
            status: row.status,
            priority: row.priority,
            created_at: row.created_at,
            due_date: row.due_date,
            project: ProjectRef {
                id: row.project_id,
                name: row.project_name,
            },
        }
    }
}

pub struct AnalyticsService {
    pool: PgPool,
    org_id: Uuid,
}

impl AnalyticsService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    /// Every organization project with its tasks, plus the flat task list
    pub async fn build(&self) -> Result<Analytics, ApiError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, start_date, end_date, status, priority,
                   org_id, created_at, updated_at
            FROM projects WHERE org_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(self.org_id)
        .fetch_all(&self.pool)
        .await?;

        let tasks: Vec<AnalyticsTask> = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT t.id, t.title, t.status, t.priority, t.created_at, t.due_date,
                   p.id AS project_id, p.name AS project_name
            FROM tasks t JOIN projects p ON p.id = t.project_id
            WHERE p.org_id = $1
            ORDER BY t.created_at
            "#,
        )
        .bind(self.org_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AnalyticsTask::from)
        .collect();

        let mut by_project: HashMap<Uuid, Vec<AnalyticsTask>> = HashMap::new();
        for task in &tasks {
            by_project.entry(task.project.id).or_default().push(task.clone());
        }

        Ok(Analytics {
            projects: projects
                .into_iter()
                .map(|project| AnalyticsProject {
                    tasks: by_project.remove(&project.id).unwrap_or_default(),
                    project,
                })
                .collect(),
            tasks,
        })
    }
}
