//! Durable store configuration
//!
//! Settings come from [`DurableConfig`] builders, or from an optional
//! `logbook.toml` in the data directory:
//!
//! ```toml
//! # "standard" (default): fsync every `sync_bytes` and on close
//! # "always": fsync after every insert
//! durability = "standard"
//! segment_size = 67108864
//! sync_bytes = 4194304
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use logbook_core::{Error, Result};

/// Config file name looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "logbook.toml";

const DEFAULT_SEGMENT_SIZE: u64 = 64 * 1024 * 1024; // 64MB
const DEFAULT_SYNC_BYTES: u64 = 4 * 1024 * 1024; // 4MB

/// When inserts are forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// fsync after every insert
    Always,
    /// fsync once `sync_bytes` have accumulated, and on close
    #[default]
    Standard,
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurabilityMode::Always => write!(f, "always"),
            DurabilityMode::Standard => write!(f, "standard"),
        }
    }
}

impl FromStr for DurabilityMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(DurabilityMode::Always),
            "standard" => Ok(DurabilityMode::Standard),
            other => Err(ConfigError::UnknownDurability(other.to_string())),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Segment size is too small (minimum 1KB)
    #[error("Segment size must be at least 1KB")]
    SegmentSizeTooSmall,

    /// Sync threshold exceeds segment size
    #[error("Sync threshold cannot exceed segment size")]
    SyncExceedsSegment,

    /// Durability string was not recognised
    #[error("Unknown durability mode: {0}")]
    UnknownDurability(String),

    /// `logbook.toml` could not be parsed
    #[error("Invalid logbook.toml: {0}")]
    Parse(String),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Contents of `logbook.toml`; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    durability: Option<DurabilityMode>,
    segment_size: Option<u64>,
    sync_bytes: Option<u64>,
}

/// Durable store configuration
#[derive(Debug, Clone)]
pub struct DurableConfig {
    /// Directory holding segment files
    pub data_dir: PathBuf,
    /// Maximum segment size in bytes before rotating (default: 64MB)
    pub segment_size: u64,
    /// Bytes between fsyncs in Standard mode (default: 4MB)
    pub sync_bytes: u64,
    /// Durability mode (default: Standard)
    pub durability: DurabilityMode,
}

impl DurableConfig {
    /// Default configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        DurableConfig {
            data_dir: data_dir.into(),
            segment_size: DEFAULT_SEGMENT_SIZE,
            sync_bytes: DEFAULT_SYNC_BYTES,
            durability: DurabilityMode::Standard,
        }
    }

    /// Defaults overlaid with `<data_dir>/logbook.toml` when the file exists
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new(data_dir);
        let path = config.data_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            config.apply_file(&text)?;
        }
        Ok(config)
    }

    fn apply_file(&mut self, text: &str) -> std::result::Result<(), ConfigError> {
        let file: FileConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(durability) = file.durability {
            self.durability = durability;
        }
        if let Some(size) = file.segment_size {
            self.segment_size = size;
        }
        if let Some(bytes) = file.sync_bytes {
            self.sync_bytes = bytes;
        }
        Ok(())
    }

    /// Set segment size (builder pattern)
    pub fn with_segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    /// Set sync threshold (builder pattern)
    pub fn with_sync_bytes(mut self, bytes: u64) -> Self {
        self.sync_bytes = bytes;
        self
    }

    /// Set durability mode (builder pattern)
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.segment_size < 1024 {
            return Err(ConfigError::SegmentSizeTooSmall);
        }
        if self.sync_bytes > self.segment_size {
            return Err(ConfigError::SyncExceedsSegment);
        }
        Ok(())
    }

    /// Small segments so tests exercise rotation
    pub fn for_testing(data_dir: impl AsRef<Path>) -> Self {
        DurableConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            segment_size: 64 * 1024,
            sync_bytes: 16 * 1024,
            durability: DurabilityMode::Standard,
        }
    }
}
