//! # Organization Registry Entry Point

use clap::{Parser, Subcommand};
use org_registry::{config::ConfigLoader, db, server::run_server, telemetry};

#[derive(Debug, Parser)]
#[command(name = "org-registry", version, about = "Multi-tenant organization registry")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Apply catalog migrations and exit
    Migrate,
    /// Print the effective configuration with secrets redacted
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Migrate => {
            let pools = db::init_pools(&config).await?;
            db::run_migrations(&pools.catalog).await?;
            tracing::info!("Catalog migrations applied");
            Ok(())
        }
        Command::PrintConfig => {
            println!("{}", config.redacted_json()?);
            Ok(())
        }
    }
}
