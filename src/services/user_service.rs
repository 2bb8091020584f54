use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{AccentColor, Role, Theme};
use crate::error::ApiError;

/// Organization user as listed to other members
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller's own profile
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub org_id: Option<Uuid>,
    pub profile_image: Option<String>,
    pub theme: Theme,
    pub accent_color: AccentColor,
}

/// Both values are closed enums, so deserializing is the whole validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ThemePreference {
    pub theme: Theme,
    pub accent_color: AccentColor,
}

const PROFILE_COLUMNS: &str = "id, name, email, role, org_id, profile_image, theme, accent_color";

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_in_organization(&self, org_id: Uuid) -> Result<Vec<UserListing>, ApiError> {
        let users = sqlx::query_as::<_, UserListing>(
            r#"
            SELECT id, name, email, role, profile_image, created_at
            FROM users
            WHERE org_id = $1
            ORDER BY email
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Profile, ApiError> {
        sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Update name and email, and the password hash when one is given.
    /// A taken email surfaces as 409.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Profile, ApiError> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = now()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn theme(&self, user_id: Uuid) -> Result<ThemePreference, ApiError> {
        sqlx::query_as::<_, ThemePreference>("SELECT theme, accent_color FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn set_theme(
        &self,
        user_id: Uuid,
        preference: ThemePreference,
    ) -> Result<ThemePreference, ApiError> {
        sqlx::query_as::<_, ThemePreference>(
            r#"
            UPDATE users SET theme = $2, accent_color = $3, updated_at = now()
            WHERE id = $1
            RETURNING theme, accent_color
            "#,
        )
        .bind(user_id)
        .bind(preference.theme)
        .bind(preference.accent_color)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
    }
}
