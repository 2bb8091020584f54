use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{SessionStore, TokenCodec, TokenError};
use crate::config::AppConfig;
use crate::database::{Database, Directory, PgDirectory};
use crate::error::ApiError;

/// Shared, read-only application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub directory: Arc<dyn Directory>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Fails when no signing secret is configured
    pub fn new(
        config: AppConfig,
        db: Database,
        directory: Arc<dyn Directory>,
    ) -> Result<Self, TokenError> {
        let secret = config.security.session_secret.as_deref().unwrap_or_default();
        let codec = TokenCodec::new(secret)?;
        let sessions = SessionStore::new(codec, directory.clone(), config.security.cookie_secure);

        Ok(Self {
            config: Arc::new(config),
            db,
            directory,
            sessions,
        })
    }

    /// State backed by PostgreSQL for both the directory and resource queries
    pub fn from_config(config: AppConfig) -> Result<Self, TokenError> {
        let db = Database::new(&config.database);
        let directory = Arc::new(PgDirectory::new(db.clone()));
        Self::new(config, db, directory)
    }

    pub async fn pool(&self) -> Result<PgPool, ApiError> {
        Ok(self.db.acquire().await?)
    }
}
