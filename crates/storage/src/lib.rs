//! Storage backends for logbook
//!
//! Two independent [`LogStore`](logbook_core::LogStore) implementations:
//! - [`InMemoryStore`]: append-only list behind one RwLock, gone on exit
//! - [`DurableStore`]: segment files on disk with an in-memory mirror and
//!   secondary indexes
//!
//! Both share the equality, time-range and pagination rules in
//! [`matcher`]. They differ on the `message` clause: the in-memory store
//! does a case-sensitive substring match, the durable store a
//! case-insensitive regex.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durable;
pub mod matcher;
pub mod memory;
pub mod tokenizer;

pub use durable::{ConfigError, DurabilityMode, DurableConfig, DurableStore};
pub use matcher::{contains, matches, page_window};
pub use memory::InMemoryStore;
