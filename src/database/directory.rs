use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::manager::{Database, DatabaseError};
use super::models::{NewUser, Organization, User};

pub(crate) const USER_COLUMNS: &str = r#"
    id, email, name, password_hash, role, org_id, profile_image,
    theme, accent_color, reset_token_hash, reset_token_expiry,
    created_at, updated_at
"#;

/// User and organization records the authentication layer depends on.
///
/// Sessions are resolved against this on every request, so the identity a
/// handler sees always reflects the current row, never stale token claims.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    /// Create an organization and make `owner_id` its admin, atomically.
    ///
    /// `NotFound` when the owner does not exist, `Conflict` when the owner
    /// already belongs to an organization.
    async fn create_organization(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Organization, DatabaseError>;

    /// Returns false when no user has this email
    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;

    /// Consume an unexpired reset token and set the new password hash.
    /// Returns false when the token is unknown or expired.
    async fn reset_password(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;
}

/// PostgreSQL-backed directory
#[derive(Clone)]
pub struct PgDirectory {
    db: Database,
}

impl PgDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let pool = self.db.acquire().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let pool = self.db.acquire().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let pool = self.db.acquire().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, org_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.org_id)
        .fetch_one(&pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Conflict(_) => {
                DatabaseError::Conflict("User already exists".to_string())
            }
            other => other,
        })?;
        Ok(user)
    }

    async fn create_organization(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Organization, DatabaseError> {
        let pool = self.db.acquire().await?;
        let mut tx = pool.begin().await?;

        let owner: Option<(Option<Uuid>,)> =
            sqlx::query_as("SELECT org_id FROM users WHERE id = $1 FOR UPDATE")
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;

        match owner {
            None => return Err(DatabaseError::NotFound(format!("User {owner_id}"))),
            Some((Some(_),)) => {
                return Err(DatabaseError::Conflict(
                    "User already belongs to an organization".to_string(),
                ))
            }
            Some((None,)) => {}
        }

        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET org_id = $1, role = 'ADMIN', updated_at = now() WHERE id = $2",
        )
        .bind(org.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(org)
    }

    async fn store_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_token_expiry = $3, updated_at = now()
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset_password(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token_hash = NULL, reset_token_expiry = NULL,
                updated_at = now()
            WHERE reset_token_hash = $1 AND reset_token_expiry > $3
            "#,
        )
        .bind(token_hash)
        .bind(password_hash)
        .bind(now)
        .execute(&pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
