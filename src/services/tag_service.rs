use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Tag;
use crate::error::ApiError;

pub struct TagService {
    pool: PgPool,
    org_id: Uuid,
}

impl TagService {
    pub fn new(pool: PgPool, org_id: Uuid) -> Self {
        Self { pool, org_id }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, ApiError> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name, color FROM tags WHERE org_id = $1 ORDER BY name",
        )
        .bind(self.org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    /// `color` must already be a validated hex colour
    pub async fn create(&self, name: &str, color: &str) -> Result<Tag, ApiError> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name, color, org_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, color
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(color)
        .bind(self.org_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(tag)
    }

    /// 404 for an unknown tag, 403 for another organization's tag
    pub async fn delete(&self, tag_id: Uuid) -> Result<(), ApiError> {
        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT org_id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            None => Err(ApiError::not_found("Tag not found")),
            Some((org_id,)) if org_id != self.org_id => {
                tracing::warn!("Refused cross-organization delete of tag {}", tag_id);
                Err(ApiError::forbidden("Forbidden"))
            }
            Some(_) => {
                sqlx::query("DELETE FROM tags WHERE id = $1")
                    .bind(tag_id)
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }
        }
    }
}
