use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection failed: {0}")]
    Connection(sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return DatabaseError::Conflict("Resource already exists".to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Shared handle to the PostgreSQL pool.
///
/// Cloning is cheap. The pool is created on the first `acquire()` and closed by
/// `shutdown()`; nothing connects until a request actually needs the database.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    url: Option<String>,
    max_connections: u32,
    connection_timeout: Duration,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url: config.url.clone(),
                max_connections: config.max_connections,
                connection_timeout: Duration::from_secs(config.connection_timeout),
                pool: OnceCell::new(),
            }),
        }
    }

    /// Get the pool, connecting lazily on first use
    pub async fn acquire(&self) -> Result<PgPool, DatabaseError> {
        let inner = &self.inner;
        let pool = inner
            .pool
            .get_or_try_init(|| async {
                let url = inner.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
                let pool = PgPoolOptions::new()
                    .max_connections(inner.max_connections)
                    .acquire_timeout(inner.connection_timeout)
                    .connect(url)
                    .await
                    .map_err(DatabaseError::Connection)?;
                info!("Created database pool (max {} connections)", inner.max_connections);
                Ok::<_, DatabaseError>(pool)
            })
            .await?;
        Ok(pool.clone())
    }

    /// Pings the database to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.acquire().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let pool = self.acquire().await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close the pool if it was ever opened
    pub async fn shutdown(&self) {
        if let Some(pool) = self.inner.pool.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.pool.initialized()
    }
}
