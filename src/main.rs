use clap::Parser;
use dotenvy::dotenv;
use loanwarden::cli::{Cli, Command};
use loanwarden::errors::Result;
use loanwarden::{config, db, jobs};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Parse the routine selection before touching configuration
    let cli = Cli::parse();

    // 4. Validate configuration once, before any store access
    let config = config::load()?;
    info!("configuration loaded");

    // 5. Connect and ping; a dead store fails the run here
    let database = db::connection::connect(&config).await?;

    // 6. Run the selected routine
    match cli.command {
        Command::Sweep => jobs::consistency::run(&database, &config).await,
        Command::ZeroBalance => jobs::zero_balance::run(&database, &config).await,
        Command::Unapplied { range, limit } => {
            jobs::unapplied::run(&database, &config, range, limit).await
        }
        Command::PruneLinks { apply } => jobs::links::run(&database, &config, apply).await,
    }
}
