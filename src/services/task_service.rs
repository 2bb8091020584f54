use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{
    Priority, ProjectRef, Tag, Task, TaskDetail, TaskStatus, UserSummary,
};
use crate::error::ApiError;
use crate::handlers::utils::not_blank;

pub(crate) const TASK_COLUMNS: &str = r#"
    t.id, t.title, t.description, t.status, t.priority, t.due_date,
    t.project_id, t.assignee_id, t.created_at, t.updated_at
"#;

/// Full task body for create and replace
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[validate(custom = "not_blank")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(custom = "not_blank")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_priority() -> Priority {
    Priority::Medium
}

#[derive(FromRow)]
struct TaskTagRow {
    task_id: Uuid,
    #[sqlx(flatten)]
    tag: Tag,
}

/// Tasks within one organization
pub struct TaskService {
    pool: PgPool,
    org_id: Uuid,
}

impl TaskService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    /// Tasks assigned to `user_id` or in one of their projects, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<TaskDetail>, ApiError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.org_id = $1
              AND (t.assignee_id = $2
                   OR EXISTS (SELECT 1 FROM project_users pu
                              WHERE pu.project_id = t.project_id AND pu.user_id = $2))
              AND ($3::uuid IS NULL OR t.project_id = $3)
            ORDER BY t.created_at DESC
            "#
        ))
        .bind(self.org_id)
        .bind(user_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        hydrate(&self.pool, tasks).await
    }

    pub async fn get(&self, task_id: Uuid) -> Result<TaskDetail, ApiError> {
        let task = self.find(task_id).await?;
        hydrate(&self.pool, vec![task])
            .await?
            .pop()
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    pub async fn create(&self, input: TaskInput) -> Result<TaskDetail, ApiError> {
        self.check_references(input.project_id, input.assignee_id, &input.tag_ids).await?;

        let mut tx = self.pool.begin().await?;
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks
                (id, title, description, status, priority, due_date, project_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, status, priority, due_date,
                      project_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.status)
        .bind(input.priority)
        .bind(input.due_date)
        .bind(input.project_id)
        .bind(input.assignee_id)
        .fetch_one(&mut *tx)
        .await?;

        set_tags(&mut tx, task.id, &input.tag_ids).await?;
        tx.commit().await?;

        tracing::info!("Created task {} in project {}", task.id, task.project_id);
        self.get(task.id).await
    }

    /// PUT: every field is replaced, including the tag set
    pub async fn replace(&self, task_id: Uuid, input: TaskInput) -> Result<TaskDetail, ApiError> {
        self.find(task_id).await?;
        self.check_references(input.project_id, input.assignee_id, &input.tag_ids).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5, due_date = $6,
                project_id = $7, assignee_id = $8, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.status)
        .bind(input.priority)
        .bind(input.due_date)
        .bind(input.project_id)
        .bind(input.assignee_id)
        .execute(&mut *tx)
        .await?;

        set_tags(&mut tx, task_id, &input.tag_ids).await?;
        tx.commit().await?;

        self.get(task_id).await
    }

    /// PATCH: only the supplied fields change
    pub async fn patch(&self, task_id: Uuid, patch: TaskPatch) -> Result<TaskDetail, ApiError> {
        let current = self.find(task_id).await?;
        let project_id = patch.project_id.unwrap_or(current.project_id);
        let assignee_id = patch.assignee_id.or(current.assignee_id);
        let tag_ids = patch.tag_ids.clone().unwrap_or_default();
        self.check_references(project_id, assignee_id, &tag_ids).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                project_id = $7,
                assignee_id = $8,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .bind(patch.title.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.status)
        .bind(patch.priority)
        .bind(patch.due_date)
        .bind(project_id)
        .bind(assignee_id)
        .execute(&mut *tx)
        .await?;

        if let Some(tag_ids) = &patch.tag_ids {
            set_tags(&mut tx, task_id, tag_ids).await?;
        }
        tx.commit().await?;

        self.get(task_id).await
    }

    pub async fn delete(&self, task_id: Uuid) -> Result<(), ApiError> {
        self.find(task_id).await?;
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        tracing::info!("Deleted task {}", task_id);
        Ok(())
    }

    /// Task by id, only when its project belongs to this organization
    pub async fn find(&self, task_id: Uuid) -> Result<Task, ApiError> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.org_id = $2
            "#
        ))
        .bind(task_id)
        .bind(self.org_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    /// Project, assignee and tags must all belong to this organization
    async fn check_references(
        &self,
        project_id: Uuid,
        assignee_id: Option<Uuid>,
        tag_ids: &[Uuid],
    ) -> Result<(), ApiError> {
        let project: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND org_id = $2")
                .bind(project_id)
                .bind(self.org_id)
                .fetch_optional(&self.pool)
                .await?;
        if project.is_none() {
            return Err(ApiError::invalid_field("projectId", "Project not found"));
        }

        if let Some(assignee_id) = assignee_id {
            let assignee: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE id = $1 AND org_id = $2")
                    .bind(assignee_id)
                    .bind(self.org_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if assignee.is_none() {
                return Err(ApiError::invalid_field("assigneeId", "Assignee not found"));
            }
        }

        if !tag_ids.is_empty() {
            let (found,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1) AND org_id = $2")
                    .bind(tag_ids)
                    .bind(self.org_id)
                    .fetch_one(&self.pool)
                    .await?;
            let mut unique = tag_ids.to_vec();
            unique.sort();
            unique.dedup();
            if found as usize != unique.len() {
                return Err(ApiError::invalid_field("tagIds", "Unknown tag"));
            }
        }

        Ok(())
    }
}

async fn set_tags(
    tx: &mut Transaction<'_, Postgres>,
    task_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

    if !tag_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Attach project, assignee and tags to each task, preserving order
pub(crate) async fn hydrate(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskDetail>, ApiError> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let project_ids: Vec<Uuid> = tasks.iter().map(|t| t.project_id).collect();
    let assignee_ids: Vec<Uuid> = tasks.iter().filter_map(|t| t.assignee_id).collect();

    let projects: HashMap<Uuid, ProjectRef> =
        sqlx::query_as::<_, ProjectRef>("SELECT id, name FROM projects WHERE id = ANY($1)")
            .bind(&project_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

    let assignees: HashMap<Uuid, UserSummary> =
        sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(&assignee_ids)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    let rows = sqlx::query_as::<_, TaskTagRow>(
        r#"
        SELECT tt.task_id, g.id, g.name, g.color
        FROM task_tags tt JOIN tags g ON g.id = tt.tag_id
        WHERE tt.task_id = ANY($1)
        ORDER BY g.name
        "#,
    )
    .bind(&task_ids)
    .fetch_all(pool)
    .await?;
    for row in rows {
        tags.entry(row.task_id).or_default().push(row.tag);
    }

    Ok(tasks
        .into_iter()
        .filter_map(|task| {
            let project = projects.get(&task.project_id)?.clone();
            let assignee = task.assignee_id.and_then(|id| assignees.get(&id).cloned());
            let tags = tags.remove(&task.id).unwrap_or_default();
            Some(TaskDetail {
                task,
                project,
                assignee,
                tags,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_input_defaults() {
        let input: TaskInput = serde_json::from_value(json!({
            "title": "Write docs",
            "projectId": Uuid::nil(),
        }))
        .unwrap();

        assert_eq!(input.status, TaskStatus::Todo);
        assert_eq!(input.priority, Priority::Medium);
        assert!(input.tag_ids.is_empty());
        assert!(input.assignee_id.is_none());
    }

    #[test]
    fn task_patch_accepts_partial_bodies() {
        let patch: TaskPatch = serde_json::from_value(json!({ "status": "IN_PROGRESS" })).unwrap();
        assert_eq!(patch.status, Some(TaskStatus::InProgress));
        assert!(patch.title.is_none());
        assert!(patch.tag_ids.is_none());
    }
}
