//! Command line and environment configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use logbook_core::{LogStore, Result};
use logbook_storage::{DurabilityMode, DurableConfig, DurableStore, InMemoryStore};

/// Which backend the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Records live in process memory and are lost on exit
    Memory,
    /// Records are written to segment files under `--data-dir`
    Durable,
}

/// Command line arguments for the logbook server.
#[derive(Debug, Clone, Parser)]
#[command(name = "logbook", about = "Structured log ingestion and query server")]
pub struct CliArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// Storage backend
    #[arg(long, value_enum, default_value = "memory", env = "LOGBOOK_STORAGE")]
    pub storage: StorageKind,

    /// Data directory for the durable backend
    #[arg(long, default_value = "./data", env = "LOGBOOK_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Override the durability mode from logbook.toml ("always" or "standard")
    #[arg(long, env = "LOGBOOK_DURABILITY")]
    pub durability: Option<DurabilityMode>,

    /// Directory with the static UI, served under /ui
    #[arg(long, env = "LOGBOOK_UI_DIR")]
    pub ui_dir: Option<PathBuf>,

    /// Deadline for one insert, in seconds
    #[arg(long, default_value = "5", env = "LOGBOOK_INSERT_TIMEOUT_SECS")]
    pub insert_timeout_secs: u64,

    /// Deadline for one query, in seconds
    #[arg(long, default_value = "10", env = "LOGBOOK_QUERY_TIMEOUT_SECS")]
    pub query_timeout_secs: u64,
}

impl CliArgs {
    /// Open the configured backend.
    pub fn open_store(&self) -> Result<Arc<dyn LogStore>> {
        match self.storage {
            StorageKind::Memory => Ok(Arc::new(InMemoryStore::new())),
            StorageKind::Durable => {
                let mut config = DurableConfig::from_data_dir(&self.data_dir)?;
                if let Some(durability) = self.durability {
                    config = config.with_durability(durability);
                }
                Ok(Arc::new(DurableStore::open(config)?))
            }
        }
    }
}

/// Settings the HTTP layer needs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Static UI directory
    pub ui_dir: Option<PathBuf>,
    /// Deadline for one insert
    pub insert_timeout: Duration,
    /// Deadline for one query
    pub query_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            ui_dir: None,
            insert_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&CliArgs> for ServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            port: args.port,
            ui_dir: args.ui_dir.clone(),
            insert_timeout: Duration::from_secs(args.insert_timeout_secs),
            query_timeout: Duration::from_secs(args.query_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["logbook"]).unwrap();
        assert_eq!(args.storage, StorageKind::Memory);
        let config = ServerConfig::from(&args);
        assert_eq!(config.insert_timeout, Duration::from_secs(5));
        assert_eq!(config.query_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_durable_flags() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs::try_parse_from([
            "logbook",
            "--port",
            "8080",
            "--storage",
            "durable",
            "--durability",
            "always",
            "--data-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.durability, Some(DurabilityMode::Always));

        let store = args.open_store().unwrap();
        store.close().unwrap();
    }

    #[test]
    fn test_unknown_storage_rejected() {
        assert!(CliArgs::try_parse_from(["logbook", "--storage", "mongo"]).is_err());
    }
}
