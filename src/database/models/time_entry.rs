use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end, when both are known
    pub duration: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Time entry with the task title and project name for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: TimeEntry,
    pub task_title: String,
    pub project_name: Option<String>,
}

/// Whole seconds between two instants, never negative
pub fn duration_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_is_whole_seconds() {
        let start = Utc::now();
        assert_eq!(duration_seconds(start, start + Duration::milliseconds(90_500)), 90);
        assert_eq!(duration_seconds(start, start - Duration::seconds(5)), 0);
    }
}
