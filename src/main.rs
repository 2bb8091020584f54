use productiveflow::{config::AppConfig, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up DATABASE_URL and NEXTAUTH_SECRET
    let _ = dotenvy::dotenv();
    server::init_tracing();

    server::serve(AppConfig::from_env()).await
}
