//! Ingestion errors

use logbook_core::Error;

/// Errors returned by [`IngestionService`](crate::IngestionService)
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The store rejected the record
    #[error("failed to insert log: {0}")]
    Insert(#[source] Error),
}

impl IngestError {
    /// The storage error underneath
    pub fn storage_error(&self) -> &Error {
        match self {
            IngestError::Insert(e) => e,
        }
    }

    /// True if the insert gave up on a deadline or cancellation
    pub fn is_cancellation(&self) -> bool {
        self.storage_error().is_cancellation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_message_and_source() {
        let err = IngestError::Insert(Error::Storage("disk unplugged".to_string()));
        assert_eq!(
            err.to_string(),
            "failed to insert log: Storage error: disk unplugged"
        );
        assert!(err.source().is_some());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_cancellation_passes_through() {
        assert!(IngestError::Insert(Error::DeadlineExceeded).is_cancellation());
    }
}
