//! Tournament manager implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    errors::{TournamentError, TournamentResult},
    models::{
        BracketView, CreatedTournament, MAX_NAME_LEN, NewTournament, Tournament, TournamentId,
    },
};
use crate::auth::UserId;
use crate::bracket::{Matchup, build_first_round, commit_round, validate_selection};
use crate::db::timeouts::DEFAULT_BATCH_TIMEOUT;
use crate::db::{
    DEFAULT_QUERY_TIMEOUT, MatchRepository, StoreError, TeamRepository, TournamentRepository,
    with_timeout,
};
use crate::matches::{FIRST_ROUND, Match, MatchSummary};
use crate::team::manager::resolve_team_refs;
use crate::team::{TeamId, TeamRef};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
    teams: Arc<dyn TeamRepository>,
    timeout: Duration,
    batch_timeout: Duration,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(
        tournaments: Arc<dyn TournamentRepository>,
        matches: Arc<dyn MatchRepository>,
        teams: Arc<dyn TeamRepository>,
    ) -> Self {
        Self {
            tournaments,
            matches,
            teams,
            timeout: DEFAULT_QUERY_TIMEOUT,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Timeout for single queries; batch writes get twice as long
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.batch_timeout = timeout.saturating_mul(2);
        self
    }

    fn validate_name(name: &str) -> TournamentResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidName(
                "tournament name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TournamentError::InvalidName(format!(
                "must be at most {MAX_NAME_LEN} characters"
            )));
        }
        Ok(name.to_string())
    }

    /// Validate and pair a team selection without writing anything
    async fn plan_first_round(&self, team_ids: &[TeamId]) -> TournamentResult<Vec<Matchup>> {
        validate_selection(team_ids)?;
        let teams = resolve_team_refs(self.teams.as_ref(), team_ids, self.timeout).await?;
        Ok(build_first_round(&teams)?)
    }

    /// Record participants and persist the first round
    async fn seed_first_round(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
        matchups: &[Matchup],
    ) -> TournamentResult<usize> {
        with_timeout(
            self.timeout,
            self.tournaments.add_participants(tournament_id, team_ids),
        )
        .await?;
        Ok(commit_round(
            self.matches.as_ref(),
            tournament_id,
            matchups,
            self.batch_timeout,
        )
        .await?)
    }

    /// Create a tournament with no teams yet
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidName` - Name blank or longer than 100 characters
    pub async fn create_tournament(
        &self,
        creator_id: UserId,
        request: NewTournament,
    ) -> TournamentResult<Tournament> {
        let request = NewTournament {
            name: Self::validate_name(&request.name)?,
            ..request
        };

        let tournament = with_timeout(
            self.timeout,
            self.tournaments.create_tournament(creator_id, &request),
        )
        .await?;
        log::info!(
            "Tournament '{}' ({}) created by {}",
            tournament.name,
            tournament.id,
            creator_id
        );
        Ok(tournament)
    }

    /// Create a tournament and its first round from the selected teams
    ///
    /// The selection is validated and paired before anything is written. If a
    /// write fails after the tournament row exists, the tournament is deleted
    /// again (cascading to participants and matches).
    ///
    /// # Errors
    ///
    /// * `TournamentError::Bracket` - Selection rejected, nothing written
    /// * `TournamentError::Team` - Unknown team id, nothing written
    /// * `TournamentError::CreationAborted` - A later write failed
    pub async fn create_with_bracket(
        &self,
        creator_id: UserId,
        request: NewTournament,
        team_ids: &[TeamId],
    ) -> TournamentResult<CreatedTournament> {
        Self::validate_name(&request.name)?;
        let matchups = self.plan_first_round(team_ids).await?;
        let tournament = self.create_tournament(creator_id, request).await?;

        match self
            .seed_first_round(tournament.id, team_ids, &matchups)
            .await
        {
            Ok(matches_created) => Ok(CreatedTournament {
                tournament,
                matches_created,
            }),
            Err(e) => {
                log::warn!(
                    "Seeding tournament {} failed, deleting it: {}",
                    tournament.id,
                    e
                );
                let rolled_back = match with_timeout(
                    self.timeout,
                    self.tournaments.delete_tournament(tournament.id),
                )
                .await
                {
                    Ok(deleted) => deleted,
                    Err(cleanup) => {
                        log::error!(
                            "Could not delete partially created tournament {}: {}",
                            tournament.id,
                            cleanup
                        );
                        false
                    }
                };
                Err(TournamentError::CreationAborted {
                    rolled_back,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Generate round 1 for an existing tournament
    ///
    /// The existing-matches check and the insert are not serialized; two
    /// concurrent calls can both pass the check.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotFound` - No such tournament
    /// * `TournamentError::NotCreator` - Requester did not create it
    /// * `TournamentError::BracketExists` - Round 1 already has matches
    pub async fn generate_bracket(
        &self,
        requester: UserId,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> TournamentResult<usize> {
        let tournament = self.get_tournament(tournament_id).await?;
        if tournament.creator_id != requester {
            return Err(TournamentError::NotCreator);
        }

        let existing = with_timeout(
            self.timeout,
            self.matches
                .matches_for_tournament(tournament_id, Some(FIRST_ROUND)),
        )
        .await?;
        if !existing.is_empty() {
            return Err(TournamentError::BracketExists);
        }

        let matchups = self.plan_first_round(team_ids).await?;
        self.seed_first_round(tournament_id, team_ids, &matchups)
            .await
    }

    /// Get a tournament by ID
    pub async fn get_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        with_timeout(self.timeout, self.tournaments.find_tournament(tournament_id))
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    /// All tournaments, newest first
    pub async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        Ok(with_timeout(self.timeout, self.tournaments.list_tournaments()).await?)
    }

    /// Tournament with its first-round matches in bracket order
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> TournamentResult<BracketView> {
        let tournament = self.get_tournament(tournament_id).await?;
        let round = with_timeout(
            self.timeout,
            self.matches
                .matches_for_tournament(tournament_id, Some(FIRST_ROUND)),
        )
        .await?;

        let team_ids = distinct_teams(&round);
        let teams = with_timeout(self.timeout, self.teams.find_teams(&team_ids)).await?;
        let names: HashMap<TeamId, TeamRef> =
            teams.iter().map(|t| (t.id, TeamRef::from(t))).collect();

        let matches = round
            .into_iter()
            .map(|m| summarize(m, &names))
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(BracketView {
            tournament,
            matches,
        })
    }
}

/// Every team playing in `round`, each listed once
fn distinct_teams(round: &[Match]) -> Vec<TeamId> {
    let mut team_ids: Vec<TeamId> = round
        .iter()
        .flat_map(|m| [m.team1_id, m.team2_id])
        .collect();
    team_ids.sort_unstable();
    team_ids.dedup();
    team_ids
}

fn summarize(m: Match, names: &HashMap<TeamId, TeamRef>) -> Result<MatchSummary, StoreError> {
    let lookup = |id: TeamId| {
        names
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::Malformed(format!("match {} references missing team {id}", m.id)))
    };
    Ok(MatchSummary {
        id: m.id,
        tournament_id: m.tournament_id,
        round_number: m.round_number,
        position: m.position,
        scheduled_at: m.scheduled_at,
        team1: lookup(m.team1_id)?,
        team2: lookup(m.team2_id)?,
        winner_team_id: m.winner_team_id,
        created_at: m.created_at,
    })
}
