//! Match listings and result recording.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::models::{Match, MatchId, MatchSummary};
use crate::auth::UserId;
use crate::db::{
    DEFAULT_QUERY_TIMEOUT, MatchRepository, StoreError, TournamentRepository, with_timeout,
};
use crate::team::TeamId;

/// Number of matches returned by default
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Match errors
#[derive(Debug, Error)]
pub enum MatchError {
    /// Match not found
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    /// Winner is not one of the two teams
    #[error("Winner must be one of the match's teams")]
    InvalidWinner,

    /// Only the tournament's creator records its results
    #[error("Only the tournament organizer can record results")]
    NotOrganizer,

    /// A winner is already recorded
    #[error("Match result already recorded")]
    AlreadyDecided,

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            MatchError::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for match operations
pub type MatchResult<T> = Result<T, MatchError>;

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    matches: Arc<dyn MatchRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    timeout: Duration,
}

impl MatchManager {
    pub fn new(
        matches: Arc<dyn MatchRepository>,
        tournaments: Arc<dyn TournamentRepository>,
    ) -> Self {
        Self {
            matches,
            tournaments,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Timeout applied to every store call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Most recent matches, newest first
    pub async fn recent_matches(&self, limit: usize) -> MatchResult<Vec<MatchSummary>> {
        Ok(with_timeout(self.timeout, self.matches.recent_matches(limit)).await?)
    }

    /// Record the winner of a match, once
    ///
    /// Tournament matches may only be decided by the tournament's creator;
    /// standalone matches by any signed-in user.
    ///
    /// # Errors
    ///
    /// * `MatchError::NotFound` - No such match
    /// * `MatchError::NotOrganizer` - Requester did not create the tournament
    /// * `MatchError::InvalidWinner` - Team did not play in the match
    /// * `MatchError::AlreadyDecided` - A winner is already recorded
    pub async fn record_result(
        &self,
        requester: UserId,
        match_id: MatchId,
        winner_team_id: TeamId,
    ) -> MatchResult<Match> {
        let mut found = with_timeout(self.timeout, self.matches.find_match(match_id))
            .await?
            .ok_or(MatchError::NotFound(match_id))?;

        if let Some(tournament_id) = found.tournament_id {
            let tournament =
                with_timeout(self.timeout, self.tournaments.find_tournament(tournament_id))
                    .await?;
            if tournament.is_none_or(|t| t.creator_id != requester) {
                return Err(MatchError::NotOrganizer);
            }
        }
        if !found.involves(winner_team_id) {
            return Err(MatchError::InvalidWinner);
        }
        if found.winner_team_id.is_some() {
            return Err(MatchError::AlreadyDecided);
        }

        with_timeout(
            self.timeout,
            self.matches.set_winner(match_id, winner_team_id),
        )
        .await?;
        log::info!("Match {} won by team {}", match_id, winner_team_id);

        found.winner_team_id = Some(winner_team_id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, TeamRepository, TournamentRepository};
    use crate::matches::NewMatch;
    use crate::tournament::{NewTournament, TournamentStructure};
    use uuid::Uuid;

    async fn played_match(store: &MemoryStore) -> Match {
        played_match_in(store, None).await
    }

    async fn played_match_in(store: &MemoryStore, tournament_id: Option<Uuid>) -> Match {
        let a = store.seed_player("Avery", None, None);
        let b = store.seed_player("Blake", None, None);
        let t1 = store.create_team("Smashers", a.id, b.id).await.unwrap();
        let t2 = store.create_team("Dinkers", b.id, a.id).await.unwrap();
        store
            .insert_matches(&[NewMatch {
                tournament_id,
                team1_id: t1.id,
                team2_id: t2.id,
                round_number: 1,
                position: 0,
                scheduled_at: None,
            }])
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn test_record_result() {
        let store = Arc::new(MemoryStore::new());
        let m = played_match(&store).await;
        let manager = MatchManager::new(store.clone(), store.clone());

        let updated = manager
            .record_result(Uuid::new_v4(), m.id, m.team2_id)
            .await
            .unwrap();
        assert_eq!(updated.winner_team_id, Some(m.team2_id));

        let recent = manager.recent_matches(DEFAULT_RECENT_LIMIT).await.unwrap();
        assert_eq!(recent[0].winner_team_id, Some(m.team2_id));
        assert_eq!(recent[0].team1.name, "Smashers");
    }

    #[tokio::test]
    async fn test_record_result_rejects_outsider() {
        let store = Arc::new(MemoryStore::new());
        let m = played_match(&store).await;
        let manager = MatchManager::new(store.clone(), store.clone());
        let user = Uuid::new_v4();

        let err = manager
            .record_result(user, m.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::InvalidWinner));

        let err = manager
            .record_result(user, Uuid::new_v4(), m.team1_id)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_result_cannot_be_overwritten() {
        let store = Arc::new(MemoryStore::new());
        let m = played_match(&store).await;
        let manager = MatchManager::new(store.clone(), store.clone());
        let user = Uuid::new_v4();

        manager.record_result(user, m.id, m.team1_id).await.unwrap();
        let err = manager
            .record_result(user, m.id, m.team2_id)
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::AlreadyDecided));
        let recent = manager.recent_matches(1).await.unwrap();
        assert_eq!(recent[0].winner_team_id, Some(m.team1_id));
    }

    #[tokio::test]
    async fn test_only_organizer_decides_tournament_match() {
        let store = Arc::new(MemoryStore::new());
        let organizer = Uuid::new_v4();
        let tournament = store
            .create_tournament(
                organizer,
                &NewTournament::new("Club Night", TournamentStructure::SingleElimination),
            )
            .await
            .unwrap();
        let m = played_match_in(&store, Some(tournament.id)).await;
        let manager = MatchManager::new(store.clone(), store.clone());

        let err = manager
            .record_result(Uuid::new_v4(), m.id, m.team1_id)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::NotOrganizer));

        let updated = manager
            .record_result(organizer, m.id, m.team1_id)
            .await
            .unwrap();
        assert_eq!(updated.winner_team_id, Some(m.team1_id));
    }
}
