use clap::Parser;
use productiveflow::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    productiveflow::server::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = productiveflow::cli::run(cli).await {
        match std::env::var("PFLOW_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
