//! Tournament error types.

use thiserror::Error;

use super::models::TournamentId;
use crate::bracket::BracketError;
use crate::db::StoreError;
use crate::team::TeamError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Name blank or too long
    #[error("Invalid tournament name: {0}")]
    InvalidName(String),

    /// Tournament not found
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    /// Only the creator may change the tournament
    #[error("Only the tournament creator can do that")]
    NotCreator,

    /// Round-1 matches already exist
    #[error("Bracket already generated for this tournament")]
    BracketExists,

    /// Team lookup failed
    #[error(transparent)]
    Team(#[from] TeamError),

    /// Selection rejected or match batch failed
    #[error(transparent)]
    Bracket(#[from] BracketError),

    /// A write after the tournament row failed; `rolled_back` tells whether
    /// the compensating delete succeeded
    #[error("Tournament creation aborted (rolled back: {rolled_back}): {source}")]
    CreationAborted {
        rolled_back: bool,
        source: Box<TournamentError>,
    },

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Innermost error, looking through `CreationAborted`
    pub fn root(&self) -> &TournamentError {
        match self {
            TournamentError::CreationAborted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Team(e) => e.client_message(),
            TournamentError::Bracket(e) => e.client_message(),
            TournamentError::Store(e) => e.client_message(),
            TournamentError::CreationAborted { source, .. } => source.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
