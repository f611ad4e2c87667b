//! In-process store used by tests and the server's `--memory` mode.
//!
//! Mirrors the PostgreSQL schema closely enough that managers behave the same
//! against either store, including the stats aggregation rules. Two fault
//! injection knobs exist for exercising error paths: a per-call latency and a
//! cap on how many rows a match batch writes before failing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::repository::{
    EXPIRED_LINK_RETENTION_HOURS, HealthCheck, MatchRepository, PlayerRepository,
    SessionRepository, StatsRepository, TeamRepository, TournamentRepository, UserRepository,
};
use crate::auth::{MagicLink, Session, User, UserId};
use crate::matches::{Match, MatchId, MatchSummary, NewMatch};
use crate::player::{Player, PlayerId, PlayerSummary};
use crate::stats::{CommonTeammate, PlayerStats};
use crate::team::{Team, TeamId, TeamRef, TeamSummary};
use crate::tournament::{NewTournament, Tournament, TournamentId, TournamentStatus};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    players: Vec<Player>,
    teams: Vec<Team>,
    tournaments: Vec<Tournament>,
    participants: Vec<(TournamentId, TeamId)>,
    matches: Vec<Match>,
    magic_links: HashMap<String, MagicLink>,
    sessions: HashMap<String, Session>,
}

impl Tables {
    fn team(&self, team_id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn username(&self, player_id: PlayerId) -> Option<String> {
        self.player(player_id).and_then(|p| p.username.clone())
    }

    fn summarize(&self, m: &Match) -> Option<MatchSummary> {
        let team1 = self.team(m.team1_id)?;
        let team2 = self.team(m.team2_id)?;
        Some(MatchSummary {
            id: m.id,
            tournament_id: m.tournament_id,
            round_number: m.round_number,
            position: m.position,
            scheduled_at: m.scheduled_at,
            team1: TeamRef::from(team1),
            team2: TeamRef::from(team2),
            winner_team_id: m.winner_team_id,
            created_at: m.created_at,
        })
    }
}

/// In-memory implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    latency_ms: AtomicU64,
    match_insert_limit: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Delay every subsequent call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Make match batches larger than `persisted` write only that many rows
    /// and then fail with [`StoreError::PartialBatch`]
    pub fn fail_match_inserts_after(&self, persisted: usize) {
        *self
            .match_insert_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(persisted);
    }

    /// Add a player profile with a fresh id
    pub fn seed_player(
        &self,
        first_name: &str,
        last_name: Option<&str>,
        username: Option<&str>,
    ) -> Player {
        let player = Player {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.map(str::to_string),
            username: username.map(str::to_string),
        };
        self.insert_player(player.clone());
        player
    }

    /// Add a player profile with a caller-chosen id, e.g. a signed-in user's id
    pub fn insert_player(&self, player: Player) {
        let mut tables = self.write();
        tables.players.retain(|p| p.id != player.id);
        tables.players.push(player);
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.delay().await;
        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn search_players(&self, query: &str, limit: usize) -> StoreResult<Vec<PlayerSummary>> {
        self.delay().await;
        let needle = query.to_lowercase();
        let tables = self.read();

        let mut found: Vec<PlayerSummary> = tables
            .players
            .iter()
            .filter(|p| {
                p.first_name.to_lowercase().contains(&needle)
                    || p
                        .last_name
                        .as_deref()
                        .is_some_and(|last| last.to_lowercase().contains(&needle))
            })
            .cloned()
            .map(PlayerSummary::from)
            .collect();
        found.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
        });
        found.truncate(limit);

        Ok(found)
    }

    async fn find_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>> {
        self.delay().await;
        Ok(self.read().player(player_id).cloned())
    }

    async fn find_player_by_username(&self, username: &str) -> StoreResult<Option<Player>> {
        self.delay().await;
        Ok(self
            .read()
            .players
            .iter()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn create_team(
        &self,
        name: &str,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> StoreResult<Team> {
        self.delay().await;
        if player1_id == player2_id {
            return Err(StoreError::Conflict("team members must differ".to_string()));
        }

        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            player1_id,
            player2_id,
            created_at: Utc::now(),
        };
        self.write().teams.push(team.clone());
        Ok(team)
    }

    async fn find_teams(&self, team_ids: &[TeamId]) -> StoreResult<Vec<Team>> {
        self.delay().await;
        Ok(self
            .read()
            .teams
            .iter()
            .filter(|t| team_ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn teams_for_player(&self, player_id: PlayerId) -> StoreResult<Vec<TeamSummary>> {
        self.delay().await;
        let tables = self.read();
        Ok(tables
            .teams
            .iter()
            .rev()
            .filter(|t| t.has_member(player_id))
            .map(|t| TeamSummary {
                id: t.id,
                name: t.name.clone(),
                player1_username: tables.username(t.player1_id),
                player2_username: tables.username(t.player2_id),
            })
            .collect())
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn create_tournament(
        &self,
        creator_id: UserId,
        request: &NewTournament,
    ) -> StoreResult<Tournament> {
        self.delay().await;
        let tournament = Tournament {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            creator_id,
            status: TournamentStatus::Upcoming,
            structure: request.structure,
            created_at: Utc::now(),
        };
        self.write().tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn find_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>> {
        self.delay().await;
        Ok(self
            .read()
            .tournaments
            .iter()
            .find(|t| t.id == tournament_id)
            .cloned())
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        self.delay().await;
        Ok(self.read().tournaments.iter().rev().cloned().collect())
    }

    async fn add_participants(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> StoreResult<usize> {
        self.delay().await;
        let mut tables = self.write();
        let mut added = 0;
        for team_id in team_ids {
            let row = (tournament_id, *team_id);
            if !tables.participants.contains(&row) {
                tables.participants.push(row);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool> {
        self.delay().await;
        let mut tables = self.write();
        let before = tables.tournaments.len();
        tables.tournaments.retain(|t| t.id != tournament_id);
        tables.participants.retain(|(id, _)| *id != tournament_id);
        tables
            .matches
            .retain(|m| m.tournament_id != Some(tournament_id));
        Ok(tables.tournaments.len() < before)
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn insert_matches(&self, matches: &[NewMatch]) -> StoreResult<Vec<Match>> {
        self.delay().await;
        if matches.iter().any(|m| m.team1_id == m.team2_id) {
            return Err(StoreError::Conflict(
                "a team cannot play itself".to_string(),
            ));
        }

        let limit = *self
            .match_insert_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let writable = limit.map_or(matches.len(), |n| n.min(matches.len()));

        let now = Utc::now();
        let stored: Vec<Match> = matches[..writable]
            .iter()
            .map(|m| Match {
                id: Uuid::new_v4(),
                tournament_id: m.tournament_id,
                team1_id: m.team1_id,
                team2_id: m.team2_id,
                round_number: m.round_number,
                position: m.position,
                scheduled_at: m.scheduled_at,
                winner_team_id: None,
                created_at: now,
            })
            .collect();
        self.write().matches.extend(stored.iter().cloned());

        if writable < matches.len() {
            return Err(StoreError::PartialBatch {
                attempted: matches.len(),
                persisted: writable,
            });
        }
        Ok(stored)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        self.delay().await;
        Ok(self.read().matches.iter().find(|m| m.id == match_id).cloned())
    }

    async fn matches_for_tournament(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> StoreResult<Vec<Match>> {
        self.delay().await;
        let mut found: Vec<Match> = self
            .read()
            .matches
            .iter()
            .filter(|m| m.tournament_id == Some(tournament_id))
            .filter(|m| round_number.is_none_or(|round| m.round_number == round))
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.round_number, m.position));
        Ok(found)
    }

    async fn recent_matches(&self, limit: usize) -> StoreResult<Vec<MatchSummary>> {
        self.delay().await;
        let tables = self.read();
        Ok(tables
            .matches
            .iter()
            .rev()
            .filter_map(|m| tables.summarize(m))
            .take(limit)
            .collect())
    }

    async fn set_winner(&self, match_id: MatchId, winner_team_id: TeamId) -> StoreResult<()> {
        self.delay().await;
        if let Some(m) = self.write().matches.iter_mut().find(|m| m.id == match_id) {
            m.winner_team_id = Some(winner_team_id);
        }
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn player_stats(&self, player_id: PlayerId) -> StoreResult<PlayerStats> {
        self.delay().await;
        let tables = self.read();
        let player_teams: Vec<&Team> = tables
            .teams
            .iter()
            .filter(|t| t.has_member(player_id))
            .collect();
        let on_player_team = |team_id: TeamId| player_teams.iter().any(|t| t.id == team_id);

        let mut stats = PlayerStats::default();
        for m in tables.matches.iter() {
            let Some(winner) = m.winner_team_id else {
                continue;
            };
            if !on_player_team(m.team1_id) && !on_player_team(m.team2_id) {
                continue;
            }
            if on_player_team(winner) {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
        }

        let mut together: HashMap<PlayerId, u32> = HashMap::new();
        for team in &player_teams {
            let Some(partner) = team.partner_of(player_id) else {
                continue;
            };
            let decided = tables
                .matches
                .iter()
                .filter(|m| m.winner_team_id.is_some() && m.involves(team.id))
                .count();
            *together.entry(partner).or_default() += u32::try_from(decided).unwrap_or(u32::MAX);
        }

        let mut teammates: Vec<CommonTeammate> = together
            .into_iter()
            .filter_map(|(partner_id, games)| {
                tables.player(partner_id).map(|p| CommonTeammate {
                    id: p.id,
                    first_name: p.first_name.clone(),
                    last_name: p.last_name.clone(),
                    games_played_together: games,
                })
            })
            .collect();
        teammates.sort_by(|a, b| {
            b.games_played_together
                .cmp(&a.games_played_together)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then_with(|| a.last_name.cmp(&b.last_name))
        });
        stats.common_teammates = teammates;

        Ok(stats)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.delay().await;
        Ok(self.read().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        self.delay().await;
        Ok(self.read().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn create_user(&self, email: &str) -> StoreResult<User> {
        self.delay().await;
        let mut tables = self.write();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: Utc::now(),
            last_sign_in: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn touch_last_sign_in(&self, user_id: UserId) -> StoreResult<()> {
        self.delay().await;
        if let Some(user) = self.write().users.iter_mut().find(|u| u.id == user_id) {
            user.last_sign_in = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn store_magic_link(
        &self,
        token_hash: &str,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.delay().await;
        let now = Utc::now();
        let cutoff = now - chrono::Duration::hours(EXPIRED_LINK_RETENTION_HOURS);
        let link = MagicLink {
            token_hash: token_hash.to_string(),
            email: email.to_string(),
            created_at: now,
            expires_at,
            consumed_at: None,
        };

        let mut tables = self.write();
        tables
            .magic_links
            .retain(|_, stored| stored.consumed_at.is_none() && stored.expires_at >= cutoff);
        tables.magic_links.insert(token_hash.to_string(), link);
        Ok(())
    }

    async fn consume_magic_link(&self, token_hash: &str) -> StoreResult<Option<MagicLink>> {
        self.delay().await;
        let mut tables = self.write();
        match tables.magic_links.get_mut(token_hash) {
            Some(link) if link.consumed_at.is_none() => {
                link.consumed_at = Some(Utc::now());
                Ok(Some(link.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session> {
        self.delay().await;
        let now = Utc::now();
        let session = Session {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at,
        };

        let mut tables = self.write();
        tables.sessions.retain(|_, s| s.expires_at >= now);
        tables.sessions.insert(token.to_string(), session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        self.delay().await;
        Ok(self.read().sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        self.delay().await;
        Ok(self.write().sessions.remove(token).is_some())
    }
}
