pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pflow")]
#[command(about = "ProductiveFlow administration CLI")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Print a bcrypt hash for a password")]
    HashPassword {
        password: String,
        #[arg(long, help = "bcrypt cost (defaults to the configured cost)")]
        cost: Option<u32>,
    },

    #[command(about = "Verify a session token with the configured secret and print its claims")]
    InspectToken { token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve().await,
        Commands::Migrate => commands::migrate(output_format).await,
        Commands::HashPassword { password, cost } => {
            commands::hash_password(&password, cost, output_format).await
        }
        Commands::InspectToken { token } => commands::inspect_token(&token, output_format),
    }
}
