//! Ingestion service for logbook
//!
//! Sits between the request layer and a [`LogStore`](logbook_core::LogStore):
//! fills in a missing timestamp from an injected clock, stores the record,
//! and wraps storage failures with operation context.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod service;

pub use error::IngestError;
pub use service::IngestionService;
