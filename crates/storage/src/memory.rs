//! InMemoryStore: append-only record list behind one RwLock
//!
//! - Inserts take the write lock, queries the read lock. Queries run
//!   concurrently with each other but never with an insert.
//! - Records come back in insertion order.
//! - `close()` is a no-op; the store stays usable.
//!
//! Each instance owns its data. There is no process-wide store, so tests
//! create one per case.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use logbook_core::{Error, LogQuery, LogRecord, LogStore, OpContext, QueryPage, Result};

use crate::matcher::{matches, page_window};

/// Thread-safe in-memory log store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<LogRecord>>,
    /// When set, every operation fails with a storage error
    fail_operations: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent operations fail (or succeed again)
    ///
    /// Lets callers exercise their storage-failure paths.
    pub fn set_fail_operations(&self, fail: bool) {
        self.fail_operations.store(fail, Ordering::SeqCst);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn simulated_failure(&self) -> Result<()> {
        if self.fail_operations.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated error".to_string()));
        }
        Ok(())
    }
}

impl LogStore for InMemoryStore {
    fn insert(&self, ctx: &OpContext, record: LogRecord) -> Result<()> {
        ctx.check()?;
        let mut records = self.records.write();
        self.simulated_failure()?;

        records.push(record);
        Ok(())
    }

    fn query(&self, ctx: &OpContext, query: &mut LogQuery) -> Result<QueryPage> {
        ctx.check()?;
        let records = self.records.read();
        self.simulated_failure()?;

        let window = query.resolve_pagination();

        let matched: Vec<&LogRecord> = records.iter().filter(|r| matches(r, query)).collect();
        let page: Vec<LogRecord> = page_window(&matched, window)
            .iter()
            .map(|r| (*r).clone())
            .collect();

        trace!(
            matched = matched.len(),
            returned = page.len(),
            page = window.page,
            "in-memory query"
        );
        Ok(QueryPage::new(page))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
