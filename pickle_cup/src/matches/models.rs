//! Match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bracket::Matchup;
use crate::team::{TeamId, TeamRef};
use crate::tournament::TournamentId;

/// Match ID type
pub type MatchId = Uuid;

/// Round number given to matches produced from the initial pairing
pub const FIRST_ROUND: u32 = 1;

/// Persisted contest between two teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// `None` for a standalone match
    pub tournament_id: Option<TournamentId>,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub round_number: u32,
    /// Slot within the round, 0-based, in bracket order
    pub position: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub winner_team_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Whether the team played in this match
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

/// Match insertion record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub tournament_id: Option<TournamentId>,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub round_number: u32,
    pub position: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewMatch {
    /// Record for the `position`-th matchup of a tournament's first round
    pub fn first_round(tournament_id: TournamentId, position: u32, matchup: &Matchup) -> Self {
        Self {
            tournament_id: Some(tournament_id),
            team1_id: matchup.team1.id,
            team2_id: matchup.team2.id,
            round_number: FIRST_ROUND,
            position,
            scheduled_at: None,
        }
    }
}

/// Match listing entry with team names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: MatchId,
    pub tournament_id: Option<TournamentId>,
    pub round_number: u32,
    pub position: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub team1: TeamRef,
    pub team2: TeamRef,
    pub winner_team_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
}

impl MatchSummary {
    /// Scheduled date as `YYYY-MM-DD`, or "Date TBD"
    pub fn date_label(&self) -> String {
        self.scheduled_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Date TBD".to_string())
    }
}

/// Result submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResultRequest {
    pub winner_team_id: TeamId,
}
