//! logbook server binary entry point.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use logbook_ingest::IngestionService;
use logbook_server::{CliArgs, LogServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!(storage = ?args.storage, port = args.port, "Opening log store");

    let store = args.open_store().context("Failed to open log store")?;
    let server = LogServer::new(IngestionService::new(store), ServerConfig::from(&args));
    server.run().await
}
