use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::project_service::project_task_statuses;
use crate::database::models::{
    ProjectRef, Role, Team, TeamDetail, TeamMember, TeamProject, UserSummary,
};
use crate::error::ApiError;
use crate::handlers::utils::not_blank;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTeam {
    #[validate(
        custom = "not_blank",
        length(max = 100, message = "Team name must be at most 100 characters")
    )]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMember {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMember {
    pub member_id: Uuid,
    pub role: Role,
}

fn default_role() -> Role {
    Role::Member
}

#[derive(FromRow)]
struct MemberRow {
    member_id: Uuid,
    team_id: Uuid,
    role: Role,
    #[sqlx(flatten)]
    user: UserSummary,
}

impl From<MemberRow> for TeamMember {
    fn from(row: MemberRow) -> Self {
        TeamMember {
            id: row.member_id,
            team_id: row.team_id,
            role: row.role,
            user: row.user,
        }
    }
}

#[derive(FromRow)]
struct TeamProjectRow {
    team_id: Uuid,
    #[sqlx(flatten)]
    project: ProjectRef,
}

const MEMBER_SELECT: &str = r#"
    SELECT tm.id AS member_id, tm.team_id, tm.role, u.id, u.name, u.email
    FROM team_members tm JOIN users u ON u.id = tm.user_id
"#;

/// Teams within one organization
pub struct TeamService {
    pool: PgPool,
    org_id: Uuid,
}

impl TeamService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    pub async fn list(&self) -> Result<Vec<TeamDetail>, ApiError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, description, org_id, created_at
            FROM teams
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(self.org_id)
        .fetch_all(&self.pool)
        .await?;

        self.details(teams).await
    }

    /// Create a team; the creator joins as its ADMIN
    pub async fn create(&self, creator_id: Uuid, input: NewTeam) -> Result<TeamDetail, ApiError> {
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (id, name, description, org_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, org_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(self.org_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO team_members (id, team_id, user_id, role) VALUES ($1, $2, $3, 'ADMIN')",
        )
        .bind(Uuid::new_v4())
        .bind(team.id)
        .bind(creator_id)
        .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Created team {} in organization {}", team.id, self.org_id);

        self.details(vec![team])
            .await?
            .pop()
            .ok_or_else(|| ApiError::internal_server_error("Failed to create team"))
    }

    /// 403 unless `user_id` is an ADMIN of a team in this organization
    pub async fn require_team_admin(&self, team_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let admin: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT tm.id FROM team_members tm JOIN teams t ON t.id = tm.team_id
            WHERE tm.team_id = $1 AND tm.user_id = $2 AND tm.role = 'ADMIN' AND t.org_id = $3
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(self.org_id)
        .fetch_optional(&self.pool)
        .await?;

        match admin {
            Some(_) => Ok(()),
            None => {
                tracing::warn!("User {} is not an admin of team {}", user_id, team_id);
                Err(ApiError::forbidden("Forbidden"))
            }
        }
    }

    /// Add an existing user of the same organization by email
    pub async fn add_member(
        &self,
        team_id: Uuid,
        input: AddMember,
    ) -> Result<TeamMember, ApiError> {
        let user: Option<(Uuid, Option<Uuid>)> =
            sqlx::query_as("SELECT id, org_id FROM users WHERE lower(email) = lower($1)")
                .bind(input.email.trim())
                .fetch_optional(&self.pool)
                .await?;

        let user_id = match user {
            None => return Err(ApiError::not_found("User not found")),
            Some((_, org_id)) if org_id != Some(self.org_id) => {
                return Err(ApiError::bad_request("User is not a member of this organization"))
            }
            Some((id, _)) => id,
        };

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (team_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(team_id)
        .bind(user_id)
        .bind(input.role)
        .fetch_optional(&self.pool)
        .await?;

        let Some((member_id,)) = inserted else {
            return Err(ApiError::bad_request("User is already a team member"));
        };
        self.member(team_id, member_id).await
    }

    pub async fn update_member(
        &self,
        team_id: Uuid,
        input: UpdateMember,
    ) -> Result<TeamMember, ApiError> {
        let updated =
            sqlx::query("UPDATE team_members SET role = $3 WHERE id = $1 AND team_id = $2")
                .bind(input.member_id)
                .bind(team_id)
                .bind(input.role)
                .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(ApiError::not_found("Team member not found"));
        }
        self.member(team_id, input.member_id).await
    }

    pub async fn remove_member(&self, team_id: Uuid, member_id: Uuid) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM team_members WHERE id = $1 AND team_id = $2")
            .bind(member_id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found("Team member not found"));
        }
        Ok(())
    }

    /// Assign an organization project to the team. Assigning twice is a no-op.
    pub async fn assign_project(
        &self,
        team_id: Uuid,
        project_id: Uuid,
    ) -> Result<TeamDetail, ApiError> {
        let project: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND org_id = $2")
                .bind(project_id)
                .bind(self.org_id)
                .fetch_optional(&self.pool)
                .await?;
        if project.is_none() {
            return Err(ApiError::not_found("Project not found"));
        }

        sqlx::query(
            r#"
            INSERT INTO team_projects (team_id, project_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(team_id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        self.get(team_id).await
    }

    pub async fn unassign_project(
        &self,
        team_id: Uuid,
        project_id: Uuid,
    ) -> Result<TeamDetail, ApiError> {
        sqlx::query("DELETE FROM team_projects WHERE team_id = $1 AND project_id = $2")
            .bind(team_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        self.get(team_id).await
    }

    pub async fn get(&self, team_id: Uuid) -> Result<TeamDetail, ApiError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, description, org_id, created_at
            FROM teams
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(team_id)
        .bind(self.org_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;

        self.details(vec![team])
            .await?
            .pop()
            .ok_or_else(|| ApiError::not_found("Team not found"))
    }

    async fn member(&self, team_id: Uuid, member_id: Uuid) -> Result<TeamMember, ApiError> {
        let sql = format!("{MEMBER_SELECT} WHERE tm.id = $1 AND tm.team_id = $2");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(member_id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .map(TeamMember::from)
            .ok_or_else(|| ApiError::not_found("Team member not found"))
    }

    async fn details(&self, teams: Vec<Team>) -> Result<Vec<TeamDetail>, ApiError> {
        let team_ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();

        let mut members: HashMap<Uuid, Vec<TeamMember>> = HashMap::new();
        let sql = format!("{MEMBER_SELECT} WHERE tm.team_id = ANY($1) ORDER BY u.email");
        for row in sqlx::query_as::<_, MemberRow>(&sql)
            .bind(&team_ids)
            .fetch_all(&self.pool)
            .await?
        {
            members.entry(row.team_id).or_default().push(row.into());
        }

        let project_rows = sqlx::query_as::<_, TeamProjectRow>(
            r#"
            SELECT tp.team_id, p.id, p.name
            FROM team_projects tp JOIN projects p ON p.id = tp.project_id
            WHERE tp.team_id = ANY($1)
            ORDER BY p.name
            "#,
        )
        .bind(&team_ids)
        .fetch_all(&self.pool)
        .await?;

        let project_ids: Vec<Uuid> = project_rows.iter().map(|r| r.project.id).collect();
        let statuses = project_task_statuses(&self.pool, &project_ids).await?;

        let mut projects: HashMap<Uuid, Vec<TeamProject>> = HashMap::new();
        for row in project_rows {
            let tasks = statuses.get(&row.project.id).cloned().unwrap_or_default();
            projects.entry(row.team_id).or_default().push(TeamProject {
                project: row.project,
                tasks,
            });
        }

        Ok(teams
            .into_iter()
            .map(|team| TeamDetail {
                members: members.remove(&team.id).unwrap_or_default(),
                projects: projects.remove(&team.id).unwrap_or_default(),
                team,
            })
            .collect())
    }
}
