//! # VCS Link Main Entry Point
//!
//! This is the main entry point for the VCS link service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use vcs_link::{config::ConfigLoader, db, server::run_server, telemetry};

#[derive(Debug, Parser)]
#[command(name = "vcs-link", version, about = "Links projects to VCS repositories")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations, then serve the HTTP API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let pool = db::init_pool(&config).await?;
    db::run_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config, pool).await,
        Command::Migrate => {
            tracing::info!("Migrations applied");
            Ok(())
        }
    }
}
