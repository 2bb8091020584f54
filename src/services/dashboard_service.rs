use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::task_service::TASK_COLUMNS;
use crate::database::models::{Priority, ProjectStatus, Task, TaskStatus};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue: usize,
    pub due_this_week: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectProgress {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub recent: Vec<ProjectProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TaskLoad {
    pub user: String,
    pub tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub user: String,
    pub action: Option<String>,
    pub duration: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub total_members: usize,
    pub recent_activities: Vec<Activity>,
    pub task_distribution: Vec<TaskLoad>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub tasks: TaskSummary,
    pub projects: ProjectSummary,
    pub team: TeamSummary,
}

/// A recent project and the statuses of its tasks
#[derive(Debug, Clone)]
pub struct ProjectTasks {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub task_statuses: Vec<TaskStatus>,
}

#[derive(FromRow)]
struct RecentProjectRow {
    id: Uuid,
    name: String,
    status: ProjectStatus,
    task_statuses: Vec<TaskStatus>,
}

/// Sunday 00:00 UTC of the week containing `now`, and the following Sunday
pub fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_since_sunday = i64::from(now.weekday().num_days_from_sunday());
    let start = (now.date_naive() - Duration::days(days_since_sunday))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, start + Duration::days(7))
}

pub fn summarize_tasks(tasks: &[Task], now: DateTime<Utc>) -> TaskSummary {
    let (week_start, week_end) = week_bounds(now);
    let mut summary = TaskSummary {
        total: tasks.len(),
        ..TaskSummary::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Todo => summary.by_status.todo += 1,
            TaskStatus::InProgress => summary.by_status.in_progress += 1,
            TaskStatus::Review => summary.by_status.review += 1,
            TaskStatus::Completed => summary.by_status.completed += 1,
        }
        match task.priority {
            Priority::Low => summary.by_priority.low += 1,
            Priority::Medium => summary.by_priority.medium += 1,
            Priority::High => summary.by_priority.high += 1,
        }

        if let Some(due) = task.due_date {
            if due < now && task.status != TaskStatus::Completed {
                summary.overdue += 1;
            }
            if due >= week_start && due < week_end {
                summary.due_this_week += 1;
            }
        }
    }

    summary
}

/// Percentage of completed tasks, rounded half up; 0 for an empty project
pub fn progress(statuses: &[TaskStatus]) -> u32 {
    if statuses.is_empty() {
        return 0;
    }
    let completed = statuses.iter().filter(|s| **s == TaskStatus::Completed).count();
    ((completed as f64 / statuses.len() as f64) * 100.0).round() as u32
}

pub fn summarize_projects(projects: &[ProjectTasks]) -> ProjectSummary {
    ProjectSummary {
        total: projects.len(),
        active: projects.iter().filter(|p| p.status == ProjectStatus::Active).count(),
        completed: projects.iter().filter(|p| p.status == ProjectStatus::Completed).count(),
        recent: projects
            .iter()
            .map(|p| ProjectProgress {
                id: p.id,
                name: p.name.clone(),
                status: p.status,
                progress: progress(&p.task_statuses),
            })
            .collect(),
    }
}

/// Per-user dashboard aggregates within one organization
pub struct DashboardService {
    pool: PgPool,
    org_id: Uuid,
}

impl DashboardService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    pub async fn build(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Dashboard, ApiError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.org_id = $1
              AND (t.assignee_id = $2
                   OR EXISTS (SELECT 1 FROM project_users pu
                              WHERE pu.project_id = t.project_id AND pu.user_id = $2))
            "#
        ))
        .bind(self.org_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let projects: Vec<ProjectTasks> = sqlx::query_as::<_, RecentProjectRow>(
            r#"
            SELECT p.id, p.name, p.status,
                   COALESCE(array_agg(t.status) FILTER (WHERE t.id IS NOT NULL), '{}')
                       AS task_statuses
            FROM projects p
            JOIN project_users pu ON pu.project_id = p.id AND pu.user_id = $2
            LEFT JOIN tasks t ON t.project_id = p.id
            WHERE p.org_id = $1
            GROUP BY p.id
            ORDER BY p.updated_at DESC
            LIMIT 5
            "#,
        )
        .bind(self.org_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| ProjectTasks {
            id: row.id,
            name: row.name,
            status: row.status,
            task_statuses: row.task_statuses,
        })
        .collect();

        let task_distribution = sqlx::query_as::<_, TaskLoad>(
            r#"
            SELECT COALESCE(u.name, u.email) AS "user",
                   (SELECT COUNT(*) FROM tasks t WHERE t.assignee_id = u.id) AS tasks
            FROM users u
            WHERE u.org_id = $1
              AND EXISTS (
                SELECT 1 FROM team_members tm
                JOIN team_projects tp ON tp.team_id = tm.team_id
                JOIN project_users pu ON pu.project_id = tp.project_id
                WHERE tm.user_id = u.id AND pu.user_id = $2)
            ORDER BY "user"
            "#,
        )
        .bind(self.org_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let recent_activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT e.id, COALESCE(u.name, u.email) AS "user", e.description AS action,
                   e.duration, e.created_at AS timestamp
            FROM time_entries e
            JOIN users u ON u.id = e.user_id
            JOIN project_users pu ON pu.project_id = e.project_id AND pu.user_id = $1
            ORDER BY e.created_at DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Dashboard {
            tasks: summarize_tasks(&tasks, now),
            projects: summarize_projects(&projects),
            team: TeamSummary {
                total_members: task_distribution.len(),
                recent_activities,
                task_distribution,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn task(status: TaskStatus, priority: Priority, due: Option<DateTime<Utc>>) -> Task {
        let now = at(2024, 1, 1, 0);
        Task {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            status,
            priority,
            due_date: due,
            project_id: Uuid::new_v4(),
            assignee_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn week_runs_sunday_to_sunday() {
        // Wednesday 2024-05-15
        let (start, end) = week_bounds(at(2024, 5, 15, 13));
        assert_eq!(start, at(2024, 5, 12, 0));
        assert_eq!(end, at(2024, 5, 19, 0));

        // Sunday itself starts the week
        let (start, _) = week_bounds(at(2024, 5, 19, 0));
        assert_eq!(start, at(2024, 5, 19, 0));
    }

    #[test]
    fn task_counts() {
        let now = at(2024, 5, 15, 12);
        let tasks = vec![
            task(TaskStatus::Todo, Priority::High, Some(at(2024, 5, 14, 0))),
            task(TaskStatus::Completed, Priority::Low, Some(at(2024, 5, 13, 0))),
            task(TaskStatus::InProgress, Priority::Medium, Some(at(2024, 5, 18, 23))),
            task(TaskStatus::Review, Priority::Medium, Some(at(2024, 5, 19, 0))),
            task(TaskStatus::Todo, Priority::Low, None),
        ];

        let summary = summarize_tasks(&tasks, now);
        assert_eq!(summary.total, 5);
        assert_eq!(
            summary.by_status,
            StatusCounts {
                todo: 2,
                in_progress: 1,
                review: 1,
                completed: 1
            }
        );
        assert_eq!(summary.by_priority, PriorityCounts { low: 2, medium: 2, high: 1 });
        // Completed past-due tasks are not overdue
        assert_eq!(summary.overdue, 1);
        // The following Sunday is outside the week
        assert_eq!(summary.due_this_week, 3);
    }

    #[test]
    fn progress_rounds_and_handles_empty() {
        use TaskStatus::*;
        assert_eq!(progress(&[]), 0);
        assert_eq!(progress(&[Completed, Todo, Todo]), 33);
        assert_eq!(progress(&[Completed, Completed, Todo]), 67);
        assert_eq!(progress(&[Completed]), 100);
    }

    #[test]
    fn project_summary() {
        let projects = vec![
            ProjectTasks {
                id: Uuid::new_v4(),
                name: "A".to_string(),
                status: ProjectStatus::Active,
                task_statuses: vec![TaskStatus::Completed, TaskStatus::Todo],
            },
            ProjectTasks {
                id: Uuid::new_v4(),
                name: "B".to_string(),
                status: ProjectStatus::Completed,
                task_statuses: vec![],
            },
        ];

        let summary = summarize_projects(&projects);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.recent[0].progress, 50);
        assert_eq!(summary.recent[1].progress, 0);
    }

    #[test]
    fn serialized_keys() {
        let value = serde_json::to_value(Dashboard::default()).unwrap();
        assert!(value["tasks"]["byStatus"].get("IN_PROGRESS").is_some());
        assert!(value["tasks"].get("dueThisWeek").is_some());
        assert!(value["team"].get("taskDistribution").is_some());
    }
}
