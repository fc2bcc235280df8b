//! Logbook - structured log ingestion with filtered, paginated queries
//!
//! Logbook accepts log records, stores them in a pluggable backend and answers
//! filtered, paginated queries over them.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use logbook::{IncomingLog, IngestionService, InMemoryStore, LogQuery, OpContext};
//!
//! let service = IngestionService::new(Arc::new(InMemoryStore::new()));
//! let ctx = OpContext::background();
//!
//! service
//!     .ingest(&ctx, IncomingLog::new("error", "Failed to connect to DB"))
//!     .unwrap();
//!
//! let mut query = LogQuery::default().with_level("error");
//! let page = service.query(&ctx, &mut query).unwrap();
//! assert_eq!(page.count, 1);
//! ```
//!
//! # Architecture
//!
//! - [`LogStore`] is the storage contract. Two variants implement it:
//!   [`InMemoryStore`] and the segment-file backed [`DurableStore`].
//! - [`IngestionService`] normalizes incoming records and hands them to a store.
//! - The HTTP surface lives in the `logbook-server` crate.

pub use logbook_core::*;
pub use logbook_ingest::{IngestError, IngestionService};
pub use logbook_storage::{DurabilityMode, DurableConfig, DurableStore, InMemoryStore};
