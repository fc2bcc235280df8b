//! Storage contract
//!
//! [`LogStore`] is the one capability both backends implement. The in-memory
//! and persistent stores share nothing internally; only the observable
//! behaviour below is common.

use crate::context::OpContext;
use crate::error::Result;
use crate::query::{LogQuery, QueryPage};
use crate::record::LogRecord;

/// Storage abstraction for log records
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait LogStore: Send + Sync {
    /// Append one record
    ///
    /// Never reorders or mutates records already stored. Concurrent inserts
    /// must neither corrupt nor drop data, and a reader never observes a
    /// partially written record.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged, or a cancellation error when
    /// `ctx` is cancelled or its deadline passes first.
    fn insert(&self, ctx: &OpContext, record: LogRecord) -> Result<()>;

    /// Return one page of records matching `query`
    ///
    /// Non-positive `page`/`limit` are rewritten in place to their defaults
    /// before the page window is computed. A page past the last match is
    /// an empty page, not an error.
    ///
    /// # Errors
    ///
    /// Returns the backend failure unchanged, or a cancellation error when
    /// `ctx` is cancelled or its deadline passes first.
    fn query(&self, ctx: &OpContext, query: &mut LogQuery) -> Result<QueryPage>;

    /// Release backend resources
    ///
    /// Call at most once, during shutdown.
    fn close(&self) -> Result<()>;
}
