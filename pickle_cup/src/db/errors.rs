//! Store error types shared by every repository implementation.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the relational data service
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Operation did not complete in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Row or procedure result did not have the expected shape
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Only part of a batch write was applied
    #[error("Batch partially persisted: {persisted} of {attempted} records")]
    PartialBatch { attempted: usize, persisted: usize },

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Client-safe message that never leaks SQL or row details
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Timeout(_) => "Request timed out".to_string(),
            StoreError::Conflict(detail) => format!("Conflict: {detail}"),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_details() {
        let err = StoreError::Malformed("round_number = -4".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_partial_batch_display() {
        let err = StoreError::PartialBatch {
            attempted: 4,
            persisted: 1,
        };
        assert_eq!(err.to_string(), "Batch partially persisted: 1 of 4 records");
    }
}
