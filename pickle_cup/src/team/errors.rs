//! Team error types.

use thiserror::Error;

use super::models::TeamId;
use crate::bracket::BracketError;
use crate::db::StoreError;

/// Team errors
#[derive(Debug, Error)]
pub enum TeamError {
    /// Request field missing or malformed
    #[error("Invalid team: {0}")]
    Validation(String),

    /// Caller has no player profile to put on a team
    #[error("A player profile is required to create a team")]
    ProfileRequired,

    /// No player has the partner username
    #[error("Partner not found: {0}")]
    PartnerNotFound(String),

    /// Partner username belongs to the caller
    #[error("You can't invite yourself to a team.")]
    SelfPartner,

    /// Team not found
    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    /// Bracket preview rejected
    #[error(transparent)]
    Bracket(#[from] BracketError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TeamError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            TeamError::Store(e) => e.client_message(),
            TeamError::Bracket(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for team operations
pub type TeamResult<T> = Result<T, TeamError>;
