use anyhow::Context;
use serde_json::json;

use super::utils::{output_error, output_success};
use super::OutputFormat;
use crate::auth::password;
use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::database::Database;
use crate::server;

pub async fn serve() -> anyhow::Result<()> {
    server::serve(AppConfig::from_env()).await
}

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;

    let db = Database::new(&config.database);
    let result = db.migrate().await;
    db.shutdown().await;
    result.context("migration failed")?;

    output_success(output_format, "Migrations applied", None)
}

pub async fn hash_password(
    password: &str,
    cost: Option<u32>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let cost = cost.unwrap_or_else(|| AppConfig::from_env().security.bcrypt_cost);
    let hash = password::hash_password(password, cost).await?;

    match output_format {
        OutputFormat::Text => println!("{hash}"),
        OutputFormat::Json => output_success(
            output_format,
            "Password hashed",
            Some(json!({ "hash": hash, "cost": cost })),
        )?,
    }
    Ok(())
}

pub fn inspect_token(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let secret = config
        .security
        .session_secret
        .as_deref()
        .context("NEXTAUTH_SECRET or SECRET_KEY must be set")?;
    let codec = TokenCodec::new(secret)?;

    match codec.verify(token) {
        Ok(claims) => {
            output_success(output_format, "Token is valid", Some(json!({ "claims": claims })))
        }
        Err(_) => {
            output_error(output_format, "invalid", Some("INVALID_TOKEN"))?;
            anyhow::bail!("token is invalid or expired")
        }
    }
}
