//! Persistent log store backed by segment files
//!
//! - `config`: [`DurableConfig`], [`DurabilityMode`], `logbook.toml`
//! - `format`: segment header and record frame layout
//! - `segment`: one segment file
//! - `writer`: append path with rotation and fsync policy
//! - `reader`: replay on open
//! - `index`: secondary indexes for query narrowing
//! - `filter`: query compilation (regex, text search)
//! - `store`: [`DurableStore`], the [`LogStore`](logbook_core::LogStore) impl

pub mod config;
pub mod filter;
pub mod format;
pub mod index;
pub mod reader;
pub mod segment;
pub mod store;
pub mod writer;

pub use config::{ConfigError, DurabilityMode, DurableConfig, CONFIG_FILE_NAME};
pub use filter::{CompiledQuery, TextSearch};
pub use store::DurableStore;
pub use writer::WriterCounters;
