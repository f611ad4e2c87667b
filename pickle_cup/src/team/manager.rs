//! Team manager implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    errors::{TeamError, TeamResult},
    models::{NewTeam, Team, TeamId, TeamRef, TeamSummary},
};
use crate::bracket::{Matchup, build_first_round, validate_selection};
use crate::db::{DEFAULT_QUERY_TIMEOUT, PlayerRepository, TeamRepository, with_timeout};
use crate::player::PlayerId;

/// Team manager
#[derive(Clone)]
pub struct TeamManager {
    teams: Arc<dyn TeamRepository>,
    players: Arc<dyn PlayerRepository>,
    timeout: Duration,
}

impl TeamManager {
    /// Create a new team manager
    pub fn new(teams: Arc<dyn TeamRepository>, players: Arc<dyn PlayerRepository>) -> Self {
        Self {
            teams,
            players,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Timeout applied to every store call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a team of the caller and a partner found by username
    ///
    /// # Arguments
    ///
    /// * `creator_id` - Caller's user id, which is also their player id
    /// * `request` - Team name and partner username
    ///
    /// # Errors
    ///
    /// * `TeamError::Validation` - Blank name or partner username
    /// * `TeamError::ProfileRequired` - Caller has no player profile
    /// * `TeamError::PartnerNotFound` - Unknown partner username
    /// * `TeamError::SelfPartner` - Partner username is the caller's own
    pub async fn create_team(&self, creator_id: PlayerId, request: NewTeam) -> TeamResult<Team> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(TeamError::Validation("team name is required".to_string()));
        }
        let partner_username = request.partner_username.trim();
        if partner_username.is_empty() {
            return Err(TeamError::Validation(
                "partner username is required".to_string(),
            ));
        }

        with_timeout(self.timeout, self.players.find_player(creator_id))
            .await?
            .ok_or(TeamError::ProfileRequired)?;

        let partner = with_timeout(
            self.timeout,
            self.players.find_player_by_username(partner_username),
        )
        .await?
        .ok_or_else(|| TeamError::PartnerNotFound(partner_username.to_string()))?;

        if partner.id == creator_id {
            return Err(TeamError::SelfPartner);
        }

        let team = with_timeout(
            self.timeout,
            self.teams.create_team(name, creator_id, partner.id),
        )
        .await?;
        log::info!("Team '{}' created by {}", team.name, creator_id);
        Ok(team)
    }

    /// Teams the player belongs to, newest first
    pub async fn teams_for_player(&self, player_id: PlayerId) -> TeamResult<Vec<TeamSummary>> {
        Ok(with_timeout(self.timeout, self.teams.teams_for_player(player_id)).await?)
    }

    /// Pair the selected teams without persisting anything
    pub async fn preview_bracket(&self, team_ids: &[TeamId]) -> TeamResult<Vec<Matchup>> {
        validate_selection(team_ids)?;
        let teams = resolve_team_refs(self.teams.as_ref(), team_ids, self.timeout).await?;
        Ok(build_first_round(&teams)?)
    }
}

/// Look up teams, keeping the caller's order
///
/// # Errors
///
/// * `TeamError::TeamNotFound` - The first id with no team
pub(crate) async fn resolve_team_refs(
    teams: &dyn TeamRepository,
    team_ids: &[TeamId],
    timeout: Duration,
) -> TeamResult<Vec<TeamRef>> {
    let found = with_timeout(timeout, teams.find_teams(team_ids)).await?;
    let by_id: HashMap<TeamId, &Team> = found.iter().map(|t| (t.id, t)).collect();

    team_ids
        .iter()
        .map(|id| {
            by_id
                .get(id)
                .map(|team| TeamRef::from(*team))
                .ok_or(TeamError::TeamNotFound(*id))
        })
        .collect()
}
