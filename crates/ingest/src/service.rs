//! IngestionService
//!
//! Stateless apart from the store and clock handles it holds. Every call
//! is independent.

use std::sync::Arc;

use tracing::debug;

use logbook_core::{
    Clock, IncomingLog, LogQuery, LogStore, OpContext, QueryPage, Result, SystemClock,
};

use crate::error::IngestError;

/// Normalizes incoming records and hands them to a store
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn LogStore>,
    clock: Arc<dyn Clock>,
}

impl IngestionService {
    /// Service over `store` using the system clock
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Service over `store` with an explicit clock
    pub fn with_clock(store: Arc<dyn LogStore>, clock: Arc<dyn Clock>) -> Self {
        IngestionService { store, clock }
    }

    /// Store one record.
    ///
    /// A missing or zero-time timestamp becomes the clock's current time.
    /// No other field is checked or changed.
    pub fn ingest(
        &self,
        ctx: &OpContext,
        incoming: IncomingLog,
    ) -> std::result::Result<(), IngestError> {
        let record = incoming.into_record(self.clock.now());
        debug!(level = %record.level, resource_id = %record.resource_id, "ingesting log");
        self.store.insert(ctx, record).map_err(IngestError::Insert)
    }

    /// Run `query` against the store; pagination defaults are applied in place
    pub fn query(&self, ctx: &OpContext, query: &mut LogQuery) -> Result<QueryPage> {
        self.store.query(ctx, query)
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService").finish_non_exhaustive()
    }
}
