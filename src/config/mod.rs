use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Signing secret for session tokens. Never serialized.
    #[serde(skip_serializing)]
    pub session_secret: Option<String>,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    /// Expose raw password-reset tokens in the API response (no mailer wired up).
    pub expose_reset_tokens: bool,
}

/// Configuration problems detected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PFLOW_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("PFLOW_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides. Two historical names exist for the signing secret.
        self.security.session_secret = env::var("NEXTAUTH_SECRET")
            .ok()
            .or_else(|| env::var("SECRET_KEY").ok())
            .filter(|s| !s.is_empty())
            .or(self.security.session_secret);
        if let Ok(v) = env::var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    /// Startup checks. A server must not come up without a signing secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.security.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(ConfigError::Missing("NEXTAUTH_SECRET or SECRET_KEY")),
        }

        let db_url = self
            .database
            .url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let parsed = url::Url::parse(db_url)
            .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidDatabaseUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Database URL with the password masked, for log lines
    pub fn redacted_database_url(&self) -> Option<String> {
        let raw = self.database.url.as_deref()?;
        let mut url = url::Url::parse(raw).ok()?;
        if url.password().is_some() {
            let _ = url.set_password(Some("****"));
        }
        Some(url.to_string())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                session_secret: None,
                cookie_secure: false,
                bcrypt_cost: 10,
                cors_origins: vec!["http://localhost:3000".to_string()],
                expose_reset_tokens: true,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                session_secret: None,
                cookie_secure: true,
                bcrypt_cost: 10,
                cors_origins: vec!["https://staging.productiveflow.app".to_string()],
                expose_reset_tokens: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                session_secret: None,
                cookie_secure: true,
                bcrypt_cost: 12,
                cors_origins: vec!["https://app.productiveflow.app".to_string()],
                expose_reset_tokens: false,
            },
        }
    }
}
