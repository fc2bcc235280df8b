//! Core types and traits for Logbook
//!
//! This crate defines the foundational types used throughout the system:
//! - LogRecord / IncomingLog: stored and incoming log entries
//! - LogQuery / QueryPage: filter + pagination request and its result
//! - LogStore: the storage contract every backend implements
//! - OpContext: per-call deadline and cancellation
//! - Clock: injectable time source
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod context;
pub mod error;
pub mod query;
pub mod record;
pub mod traits;

pub use clock::{Clock, MockClock, SystemClock};
pub use context::OpContext;
pub use error::{Error, Result};
pub use query::{LogQuery, Pagination, QueryPage, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use record::{is_zero_time, IncomingLog, LogRecord, PARENT_RESOURCE_ID_KEY};
pub use traits::LogStore;
