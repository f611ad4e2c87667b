//! Player error types.

use thiserror::Error;

use super::models::PlayerId;
use crate::db::StoreError;

/// Player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Search query missing or blank
    #[error("Search query is required")]
    EmptyQuery,

    /// Player not found
    #[error("Player not found: {0}")]
    NotFound(PlayerId),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PlayerError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            PlayerError::NotFound(_) => "Player not found".to_string(),
            PlayerError::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for player operations
pub type PlayerResult<T> = Result<T, PlayerError>;
