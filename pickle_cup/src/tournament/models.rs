//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::UserId;
use crate::matches::MatchSummary;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Maximum tournament name length in characters
pub const MAX_NAME_LEN: usize = 100;

/// Tournament status
///
/// Transitions happen outside this crate; the value is stored and reported as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Not started yet
    #[default]
    Upcoming,
    /// Matches are being played
    Ongoing,
    /// All matches played
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Completed => "completed",
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "ongoing" => Ok(TournamentStatus::Ongoing),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(format!("unknown tournament status '{other}'")),
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elimination format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStructure {
    #[default]
    SingleElimination,
    DoubleElimination,
}

impl TournamentStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStructure::SingleElimination => "single_elimination",
            TournamentStructure::DoubleElimination => "double_elimination",
        }
    }

    /// Human-readable label, e.g. "single elimination"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl FromStr for TournamentStructure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(TournamentStructure::SingleElimination),
            "double_elimination" => Ok(TournamentStructure::DoubleElimination),
            other => Err(format!("unknown tournament structure '{other}'")),
        }
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub creator_id: UserId,
    pub status: TournamentStatus,
    pub structure: TournamentStructure,
    pub created_at: DateTime<Utc>,
}

/// Tournament creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    #[serde(default)]
    pub structure: TournamentStructure,
}

impl NewTournament {
    pub fn new(name: impl Into<String>, structure: TournamentStructure) -> Self {
        Self {
            name: name.into(),
            structure,
        }
    }
}

/// Result of creating a tournament, with the number of round-1 matches seeded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTournament {
    pub tournament: Tournament,
    pub matches_created: usize,
}

/// A tournament together with its first-round matches in bracket order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketView {
    pub tournament: Tournament,
    pub matches: Vec<MatchSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TournamentStatus::Upcoming,
            TournamentStatus::Ongoing,
            TournamentStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<TournamentStatus>(), Ok(status));
        }
        assert!("registering".parse::<TournamentStatus>().is_err());
    }

    #[test]
    fn test_structure_label() {
        assert_eq!(
            TournamentStructure::DoubleElimination.label(),
            "double elimination"
        );
    }

    #[test]
    fn test_new_tournament_defaults_to_single_elimination() {
        let request: NewTournament = serde_json::from_str(r#"{"name":"Cash Money Cup"}"#).unwrap();
        assert_eq!(request.structure, TournamentStructure::SingleElimination);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TournamentStatus::Ongoing).unwrap();
        assert_eq!(json, "\"ongoing\"");
    }
}
