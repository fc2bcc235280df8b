//! Error types for Logbook storage
//!
//! Every storage backend reports failures through [`Error`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Cancellation is kept apart from storage failures: callers that set a
//! deadline or trip a cancellation flag get [`Error::DeadlineExceeded`] or
//! [`Error::Cancelled`], never a generic storage error.

use std::io;
use thiserror::Error;

/// Result type alias for Logbook storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Logbook storage backends
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Query could not be translated by the backend
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Backend failure (unavailable, write rejected)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the operation completed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The store has been closed
    #[error("Store is closed")]
    Closed,
}

impl Error {
    /// True for [`Error::Cancelled`] and [`Error::DeadlineExceeded`]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}
