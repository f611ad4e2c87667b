//! Repository trait definitions for testability and dependency injection.
//!
//! Managers depend on these traits rather than on a connection pool, so the
//! same business logic runs against [`PgStore`](super::PgStore) in production
//! and [`MemoryStore`](super::MemoryStore) in tests and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::StoreResult;
use crate::auth::{MagicLink, Session, User, UserId};
use crate::matches::{Match, MatchId, MatchSummary, NewMatch};
use crate::player::{Player, PlayerId, PlayerSummary};
use crate::stats::PlayerStats;
use crate::team::{Team, TeamId, TeamSummary};
use crate::tournament::{NewTournament, Tournament, TournamentId};

/// Liveness probe for the backing store
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Trait for player lookups
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Case-insensitive substring match on first or last name
    async fn search_players(&self, query: &str, limit: usize) -> StoreResult<Vec<PlayerSummary>>;

    /// Find player by ID
    async fn find_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>>;

    /// Find player by exact username
    async fn find_player_by_username(&self, username: &str) -> StoreResult<Option<Player>>;
}

/// Trait for team repository operations
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team of two players
    async fn create_team(
        &self,
        name: &str,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> StoreResult<Team>;

    /// Fetch the teams with the given ids; unknown ids are skipped, order is unspecified
    async fn find_teams(&self, team_ids: &[TeamId]) -> StoreResult<Vec<Team>>;

    /// Teams the player belongs to, newest first
    async fn teams_for_player(&self, player_id: PlayerId) -> StoreResult<Vec<TeamSummary>>;
}

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Create a tournament with status `upcoming`
    async fn create_tournament(
        &self,
        creator_id: UserId,
        request: &NewTournament,
    ) -> StoreResult<Tournament>;

    /// Find tournament by ID
    async fn find_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>>;

    /// Record participating teams; returns the number of new rows
    async fn add_participants(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> StoreResult<usize>;

    /// Delete a tournament with its participants and matches
    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool>;
}

/// Trait for match repository operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert a batch of matches, returning the stored rows in input order
    async fn insert_matches(&self, matches: &[NewMatch]) -> StoreResult<Vec<Match>>;

    /// Find match by ID
    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>>;

    /// Matches of a tournament ordered by round then position, optionally for one round
    async fn matches_for_tournament(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> StoreResult<Vec<Match>>;

    /// Most recent matches with team names, newest first
    async fn recent_matches(&self, limit: usize) -> StoreResult<Vec<MatchSummary>>;

    /// Record the winning team
    async fn set_winner(&self, match_id: MatchId, winner_team_id: TeamId) -> StoreResult<()>;
}

/// Stats aggregation procedure
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn player_stats(&self, player_id: PlayerId) -> StoreResult<PlayerStats>;
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by (lower-cased) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find user by ID
    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Create a user for a first-time sign-in
    async fn create_user(&self, email: &str) -> StoreResult<User>;

    /// Update the user's last sign-in timestamp
    async fn touch_last_sign_in(&self, user_id: UserId) -> StoreResult<()>;
}

/// Hours an expired, unused magic link is kept so a late click still reports expiry
pub const EXPIRED_LINK_RETENTION_HOURS: i64 = 24;

/// Trait for magic link and session persistence
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store the hash of a freshly issued magic link token
    ///
    /// Consumed links and links expired for longer than
    /// [`EXPIRED_LINK_RETENTION_HOURS`] are purged first.
    async fn store_magic_link(
        &self,
        token_hash: &str,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Mark an unconsumed link as consumed and return it
    ///
    /// Returns `None` if the hash is unknown or the link was already used.
    async fn consume_magic_link(&self, token_hash: &str) -> StoreResult<Option<MagicLink>>;

    /// Create a refresh-token session, purging expired sessions first
    async fn create_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session>;

    /// Find session by refresh token
    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Delete a session; returns whether one existed
    async fn delete_session(&self, token: &str) -> StoreResult<bool>;
}

/// Everything the application needs from a backing store
pub trait Store:
    HealthCheck
    + PlayerRepository
    + TeamRepository
    + TournamentRepository
    + MatchRepository
    + StatsRepository
    + UserRepository
    + SessionRepository
{
}

impl<T> Store for T where
    T: HealthCheck
        + PlayerRepository
        + TeamRepository
        + TournamentRepository
        + MatchRepository
        + StatsRepository
        + UserRepository
        + SessionRepository
{
}
