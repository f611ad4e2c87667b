//! Bracket error types.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::team::TeamId;

/// Why a team selection cannot be paired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Fewer than two teams
    TooFewTeams,
    /// An odd number of teams
    OddTeamCount,
    /// The same team selected twice
    DuplicateTeam(TeamId),
}

impl ValidationReason {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::TooFewTeams => "too_few_teams",
            ValidationReason::OddTeamCount => "odd_team_count",
            ValidationReason::DuplicateTeam(_) => "duplicate_team",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::TooFewTeams => f.write_str("at least two teams are required"),
            ValidationReason::OddTeamCount => f.write_str("an even number of teams is required"),
            ValidationReason::DuplicateTeam(id) => write!(f, "team {id} was selected twice"),
        }
    }
}

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    /// Selection rejected before anything was written
    #[error("Invalid team selection: {0}")]
    Validation(ValidationReason),

    /// Match batch failed, possibly after some records were written
    #[error("Failed to persist matches ({persisted} of {attempted} written): {message}")]
    Persistence {
        attempted: usize,
        persisted: usize,
        message: String,
    },

    /// Store did not answer in time
    #[error("Match persistence timed out after {0:?}")]
    Timeout(Duration),
}

impl BracketError {
    /// Reason code for validation failures
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            BracketError::Validation(reason) => Some(reason.code()),
            _ => None,
        }
    }

    /// Client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Validation(reason) => format!("Invalid team selection: {reason}"),
            BracketError::Persistence { .. } => "Failed to save matches".to_string(),
            BracketError::Timeout(_) => "Request timed out".to_string(),
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
