use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{LogFormat, Settings};
use database::{CustomizationStore, DbPool, DbRepository};
use std::path::PathBuf;

/// The main entry point for the order customization service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; DATABASE_URL may come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    let _log_guard = configuration::init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => {
            if let Some(port) = args.port {
                settings.server.port = port;
            }
            web_server::run_server(&settings).await
        }
        Commands::CheckDb => handle_check_db(&settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// HTTP API for order customizations and ingredient lookup.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file falls back to defaults.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `logging.format` from the configuration.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Connect to the database, run a trivial statement and print the pool status.
    CheckDb,
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.port` from the configuration.
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// check-db Command Logic
// ==============================================================================

async fn handle_check_db(settings: &Settings) -> anyhow::Result<()> {
    let pool = DbPool::connect(&settings.database).await?;
    let repo = DbRepository::new(pool.clone());
    repo.ping().await.context("database did not answer SELECT 1")?;

    let status = repo.pool_status();
    let mut table = Table::new();
    table.set_header(vec!["Size", "Idle", "In use", "Max connections"]);
    table.add_row(vec![
        status.size.to_string(),
        status.idle.to_string(),
        status.in_use.to_string(),
        status.max_connections.to_string(),
    ]);
    println!("Database is reachable.");
    println!("{table}");

    pool.close().await;
    Ok(())
}
