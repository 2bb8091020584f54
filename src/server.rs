use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "productiveflow=info,tower_http=info";

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Validate configuration, bind and serve until Ctrl+C or SIGTERM
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Starting ProductiveFlow in {:?} mode (database: {})",
        config.environment,
        config.redacted_database_url().unwrap_or_default()
    );

    let state = AppState::from_config(config).context("failed to initialize session signing")?;
    let db = state.db.clone();
    let app = crate::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("ProductiveFlow listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received terminate signal, starting graceful shutdown"),
    }
}
