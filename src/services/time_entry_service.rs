use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::time_entry::duration_seconds;
use crate::database::models::{TimeEntry, TimeEntryDetail};
use crate::error::ApiError;

const ENTRY_SELECT: &str = r#"
    SELECT e.id, e.task_id, e.user_id, e.project_id, e.start_time, e.end_time,
           e.duration, e.description, e.created_at,
           t.title AS task_title, p.name AS project_name
    FROM time_entries e
    JOIN tasks t ON t.id = e.task_id
    LEFT JOIN projects p ON p.id = e.project_id
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryQuery {
    pub task_id: Option<Uuid>,
    /// `in-progress` restricts to entries without an end time
    pub status: Option<String>,
}

impl TimeEntryQuery {
    pub fn in_progress_only(&self) -> bool {
        self.status.as_deref() == Some("in-progress")
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartEntry {
    pub task_id: Uuid,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry {
    pub id: Uuid,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// An entry may not end before it starts
pub fn check_interval(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<(), ApiError> {
    match end {
        Some(end) if end < start => Err(ApiError::invalid_field(
            "endTime",
            "End time must not be before start time",
        )),
        _ => Ok(()),
    }
}

/// Time entries owned by one user
pub struct TimeEntryService {
    pool: PgPool,
    user_id: Uuid,
}

impl TimeEntryService {
    pub fn new(pool: PgPool, user_id: Uuid) -> Self {
        Self { pool, user_id }
    }

    /// Own entries, newest start first
    pub async fn list(&self, query: &TimeEntryQuery) -> Result<Vec<TimeEntryDetail>, ApiError> {
        let entries = sqlx::query_as::<_, TimeEntryDetail>(&format!(
            r#"
            {ENTRY_SELECT}
            WHERE e.user_id = $1
              AND ($2::uuid IS NULL OR e.task_id = $2)
              AND (NOT $3 OR e.end_time IS NULL)
            ORDER BY e.start_time DESC
            "#
        ))
        .bind(self.user_id)
        .bind(query.task_id)
        .bind(query.in_progress_only())
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Start (or record) an entry on a task in `org_id`; the project is copied from the task
    pub async fn start(
        &self,
        org_id: Option<Uuid>,
        input: StartEntry,
    ) -> Result<TimeEntryDetail, ApiError> {
        let start_time = input.start_time.unwrap_or_else(Utc::now);
        check_interval(start_time, input.end_time)?;

        let task: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT t.project_id FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.org_id = $2
            "#,
        )
        .bind(input.task_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((project_id,)) = task else {
            return Err(ApiError::not_found("Task not found"));
        };

        let duration = input.end_time.map(|end| duration_seconds(start_time, end));

        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries
                (id, task_id, user_id, project_id, start_time, end_time, duration, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, task_id, user_id, project_id, start_time, end_time, duration,
                      description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.task_id)
        .bind(self.user_id)
        .bind(project_id)
        .bind(start_time)
        .bind(input.end_time)
        .bind(duration)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("User {} started time entry {}", self.user_id, entry.id);
        self.get(entry.id).await
    }

    /// Stop or annotate one of the caller's entries
    pub async fn update(&self, input: UpdateEntry) -> Result<TimeEntryDetail, ApiError> {
        let current = self.find(input.id).await?;
        let end_time = input.end_time.or(current.end_time);
        check_interval(current.start_time, end_time)?;
        let duration = end_time.map(|end| duration_seconds(current.start_time, end));

        sqlx::query(
            r#"
            UPDATE time_entries
            SET end_time = $2, duration = $3, description = COALESCE($4, description)
            WHERE id = $1 AND user_id = $5
            "#,
        )
        .bind(input.id)
        .bind(end_time)
        .bind(duration)
        .bind(&input.description)
        .bind(self.user_id)
        .execute(&self.pool)
        .await?;

        self.get(input.id).await
    }

    async fn find(&self, id: Uuid) -> Result<TimeEntry, ApiError> {
        sqlx::query_as::<_, TimeEntry>(
            r#"
            SELECT id, task_id, user_id, project_id, start_time, end_time, duration,
                   description, created_at
            FROM time_entries WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Time entry not found"))
    }

    async fn get(&self, id: Uuid) -> Result<TimeEntryDetail, ApiError> {
        sqlx::query_as::<_, TimeEntryDetail>(&format!(
            "{ENTRY_SELECT} WHERE e.id = $1 AND e.user_id = $2"
        ))
        .bind(id)
        .bind(self.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Time entry not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_filter() {
        let query = TimeEntryQuery {
            task_id: None,
            status: Some("in-progress".to_string()),
        };
        assert!(query.in_progress_only());
        assert!(!TimeEntryQuery::default().in_progress_only());
    }

    #[test]
    fn entries_cannot_end_before_they_start() {
        let start = Utc::now();
        assert!(check_interval(start, None).is_ok());
        assert!(check_interval(start, Some(start)).is_ok());
        assert!(check_interval(start, Some(start + chrono::Duration::minutes(5))).is_ok());

        let err = check_interval(start, Some(start - chrono::Duration::seconds(1))).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_json()["field_errors"]["endTime"],
            "End time must not be before start time"
        );
    }
}
