//! PostgreSQL implementation of the repository traits.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::errors::{StoreError, StoreResult};
use super::repository::{
    EXPIRED_LINK_RETENTION_HOURS, HealthCheck, MatchRepository, PlayerRepository,
    SessionRepository, StatsRepository, TeamRepository, TournamentRepository, UserRepository,
};
use crate::auth::{MagicLink, Session, User, UserId};
use crate::matches::{Match, MatchId, MatchSummary, NewMatch};
use crate::player::{Player, PlayerId, PlayerSummary};
use crate::stats::{PlayerStats, parse_stats};
use crate::team::{Team, TeamId, TeamRef, TeamSummary};
use crate::tournament::{NewTournament, Tournament, TournamentId};

/// Repository implementation backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn utc(row: &PgRow, column: &str) -> DateTime<Utc> {
    row.get::<NaiveDateTime, _>(column).and_utc()
}

fn utc_opt(row: &PgRow, column: &str) -> Option<DateTime<Utc>> {
    row.get::<Option<NaiveDateTime>, _>(column)
        .map(|t| t.and_utc())
}

fn unsigned(row: &PgRow, column: &str) -> StoreResult<u32> {
    let value: i32 = row.get(column);
    u32::try_from(value).map_err(|_| StoreError::Malformed(format!("{column} = {value}")))
}

fn signed(value: u32, what: &str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Malformed(format!("{what} = {value}")))
}

fn conflict_or(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        _ => StoreError::Database(e),
    }
}

fn player_from_row(row: &PgRow) -> Player {
    Player {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
    }
}

fn team_from_row(row: &PgRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        player1_id: row.get("player1_id"),
        player2_id: row.get("player2_id"),
        created_at: utc(row, "created_at"),
    }
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let status: String = row.get("status");
    let structure: String = row.get("structure");
    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        creator_id: row.get("creator_id"),
        status: status.parse().map_err(StoreError::Malformed)?,
        structure: structure.parse().map_err(StoreError::Malformed)?,
        created_at: utc(row, "created_at"),
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    Ok(Match {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        team1_id: row.get("team1_id"),
        team2_id: row.get("team2_id"),
        round_number: unsigned(row, "round_number")?,
        position: unsigned(row, "position")?,
        scheduled_at: utc_opt(row, "scheduled_at"),
        winner_team_id: row.get("winner_team_id"),
        created_at: utc(row, "created_at"),
    })
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        created_at: utc(row, "created_at"),
        last_sign_in: utc_opt(row, "last_sign_in"),
    }
}

const MATCH_COLUMNS: &str = "id, tournament_id, team1_id, team2_id, round_number, position, \
                             scheduled_at, winner_team_id, created_at";

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn search_players(&self, query: &str, limit: usize) -> StoreResult<Vec<PlayerSummary>> {
        let pattern = format!("%{}%", escape_like(query));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, first_name, last_name
            FROM players
            WHERE first_name ILIKE $1 ESCAPE '\' OR last_name ILIKE $1 ESCAPE '\'
            ORDER BY first_name, last_name NULLS FIRST
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PlayerSummary {
                id: row.get("id"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
            })
            .collect())
    }

    async fn find_player(&self, player_id: PlayerId) -> StoreResult<Option<Player>> {
        let row = sqlx::query("SELECT id, first_name, last_name, username FROM players WHERE id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(player_from_row))
    }

    async fn find_player_by_username(&self, username: &str) -> StoreResult<Option<Player>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, username FROM players WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(player_from_row))
    }
}

#[async_trait]
impl TeamRepository for PgStore {
    async fn create_team(
        &self,
        name: &str,
        player1_id: PlayerId,
        player2_id: PlayerId,
    ) -> StoreResult<Team> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (name, player1_id, player2_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, player1_id, player2_id, created_at
            "#,
        )
        .bind(name)
        .bind(player1_id)
        .bind(player2_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(team_from_row(&row))
    }

    async fn find_teams(&self, team_ids: &[TeamId]) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT id, name, player1_id, player2_id, created_at FROM teams WHERE id = ANY($1)",
        )
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(team_from_row).collect())
    }

    async fn teams_for_player(&self, player_id: PlayerId) -> StoreResult<Vec<TeamSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name,
                   p1.username AS player1_username,
                   p2.username AS player2_username
            FROM teams t
            LEFT JOIN players p1 ON p1.id = t.player1_id
            LEFT JOIN players p2 ON p2.id = t.player2_id
            WHERE t.player1_id = $1 OR t.player2_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TeamSummary {
                id: row.get("id"),
                name: row.get("name"),
                player1_username: row.get("player1_username"),
                player2_username: row.get("player2_username"),
            })
            .collect())
    }
}

#[async_trait]
impl TournamentRepository for PgStore {
    async fn create_tournament(
        &self,
        creator_id: UserId,
        request: &NewTournament,
    ) -> StoreResult<Tournament> {
        let row = sqlx::query(
            r#"
            INSERT INTO tournaments (name, creator_id, structure)
            VALUES ($1, $2, $3)
            RETURNING id, name, creator_id, status, structure, created_at
            "#,
        )
        .bind(&request.name)
        .bind(creator_id)
        .bind(request.structure.as_str())
        .fetch_one(&self.pool)
        .await?;
        tournament_from_row(&row)
    }

    async fn find_tournament(&self, tournament_id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(
            "SELECT id, name, creator_id, status, structure, created_at FROM tournaments WHERE id = $1",
        )
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, creator_id, status, structure, created_at
            FROM tournaments
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(tournament_from_row).collect()
    }

    async fn add_participants(
        &self,
        tournament_id: TournamentId,
        team_ids: &[TeamId],
    ) -> StoreResult<usize> {
        let result = sqlx::query(
            r#"
            INSERT INTO tournament_participants (tournament_id, team_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(tournament_id)
        .bind(team_ids)
        .execute(&self.pool)
        .await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }

    async fn delete_tournament(&self, tournament_id: TournamentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn insert_matches(&self, matches: &[NewMatch]) -> StoreResult<Vec<Match>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(matches.len());

        let sql = format!(
            "INSERT INTO matches (tournament_id, team1_id, team2_id, round_number, position, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {MATCH_COLUMNS}"
        );
        for m in matches {
            let row = sqlx::query(&sql)
                .bind(m.tournament_id)
                .bind(m.team1_id)
                .bind(m.team2_id)
                .bind(signed(m.round_number, "round_number")?)
                .bind(signed(m.position, "position")?)
                .bind(m.scheduled_at.map(|t| t.naive_utc()))
                .fetch_one(&mut *tx)
                .await?;
            stored.push(match_from_row(&row)?);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn find_match(&self, match_id: MatchId) -> StoreResult<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn matches_for_tournament(
        &self,
        tournament_id: TournamentId,
        round_number: Option<u32>,
    ) -> StoreResult<Vec<Match>> {
        let round = round_number
            .map(|r| signed(r, "round_number"))
            .transpose()?;
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches \
             WHERE tournament_id = $1 AND ($2::INT4 IS NULL OR round_number = $2) \
             ORDER BY round_number, position"
        );
        let rows = sqlx::query(&sql)
            .bind(tournament_id)
            .bind(round)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn recent_matches(&self, limit: usize) -> StoreResult<Vec<MatchSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.tournament_id, m.round_number, m.position, m.scheduled_at,
                   m.winner_team_id, m.created_at,
                   t1.id AS team1_id, t1.name AS team1_name,
                   t2.id AS team2_id, t2.name AS team2_name
            FROM matches m
            JOIN teams t1 ON t1.id = m.team1_id
            JOIN teams t2 ON t2.id = m.team2_id
            ORDER BY m.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<MatchSummary> {
                Ok(MatchSummary {
                    id: row.get("id"),
                    tournament_id: row.get("tournament_id"),
                    round_number: unsigned(row, "round_number")?,
                    position: unsigned(row, "position")?,
                    scheduled_at: utc_opt(row, "scheduled_at"),
                    team1: TeamRef::new(row.get("team1_id"), row.get::<String, _>("team1_name")),
                    team2: TeamRef::new(row.get("team2_id"), row.get::<String, _>("team2_name")),
                    winner_team_id: row.get("winner_team_id"),
                    created_at: utc(row, "created_at"),
                })
            })
            .collect()
    }

    async fn set_winner(&self, match_id: MatchId, winner_team_id: TeamId) -> StoreResult<()> {
        sqlx::query("UPDATE matches SET winner_team_id = $2 WHERE id = $1")
            .bind(match_id)
            .bind(winner_team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for PgStore {
    async fn player_stats(&self, player_id: PlayerId) -> StoreResult<PlayerStats> {
        let row = sqlx::query("SELECT get_player_stats($1) AS stats")
            .bind(player_id)
            .fetch_one(&self.pool)
            .await?;
        parse_stats(row.get::<serde_json::Value, _>("stats"))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, created_at, last_sign_in FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at, last_sign_in FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, email: &str) -> StoreResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (email) VALUES ($1) RETURNING id, email, created_at, last_sign_in",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "email already registered"))?;
        Ok(user_from_row(&row))
    }

    async fn touch_last_sign_in(&self, user_id: UserId) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_sign_in = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn store_magic_link(
        &self,
        token_hash: &str,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let cutoff = Utc::now() - chrono::Duration::hours(EXPIRED_LINK_RETENTION_HOURS);
        sqlx::query("DELETE FROM magic_links WHERE consumed_at IS NOT NULL OR expires_at < $1")
            .bind(cutoff.naive_utc())
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO magic_links (token_hash, email, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(email)
        .bind(expires_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "magic link token reused"))?;
        Ok(())
    }

    async fn consume_magic_link(&self, token_hash: &str) -> StoreResult<Option<MagicLink>> {
        let row = sqlx::query(
            r#"
            UPDATE magic_links
            SET consumed_at = NOW()
            WHERE token_hash = $1 AND consumed_at IS NULL
            RETURNING token_hash, email, created_at, expires_at, consumed_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| MagicLink {
            token_hash: row.get("token_hash"),
            email: row.get("email"),
            created_at: utc(&row, "created_at"),
            expires_at: utc(&row, "expires_at"),
            consumed_at: utc_opt(&row, "consumed_at"),
        }))
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session> {
        sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(Session {
            token: row.get("token"),
            user_id: row.get("user_id"),
            created_at: utc(&row, "created_at"),
            expires_at: utc(&row, "expires_at"),
        })
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Session {
            token: row.get("token"),
            user_id: row.get("user_id"),
            created_at: utc(&row, "created_at"),
            expires_at: utc(&row, "expires_at"),
        }))
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("ann"), "ann");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
