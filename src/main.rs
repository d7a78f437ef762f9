use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reqcap::config::Config;
use reqcap::store::{self, RecordStore};
use reqcap::web::{self, templates::Templates};
use reqcap::CaptureEngine;

#[derive(Parser)]
#[command(name = "reqcap", about = "Capture HTTP requests and serve them back by fingerprint")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the capture server (default)
    Serve,
    /// Create the record table and index
    CreateDb,
    /// Drop the record table and index
    DropDb,
}

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::CreateDb => {
            store::create_schema(&config.database.path)
                .with_context(|| format!("creating schema at {:?}", config.database.path))?;
            tracing::info!("Database tables created!");
        }
        Command::DropDb => {
            store::drop_schema(&config.database.path)
                .with_context(|| format!("dropping schema at {:?}", config.database.path))?;
            tracing::info!("Database tables removed!");
        }
        Command::Serve => {
            let store = RecordStore::open(&config.database).context("opening record store")?;
            let templates = Templates::load().context("loading templates")?;
            let engine = CaptureEngine::new(store, templates, config.server.clone());

            tracing::info!("Reqcap v{} starting", env!("CARGO_PKG_VERSION"));
            web::start_server(engine).await.context("running capture server")?;
        }
    }

    Ok(())
}
