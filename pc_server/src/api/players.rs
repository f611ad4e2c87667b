//! Player search, profile and stats handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use pickle_cup::player::{Player, PlayerError, PlayerId, PlayerSummary};
use pickle_cup::stats::PlayerStats;

use super::AppState;
use super::errors::{ApiResult, player_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerStatsResponse {
    pub player: PlayerSummary,
    pub stats: PlayerStats,
    pub games_played: u64,
    /// One-decimal percentage or "N/A"
    pub win_rate: String,
}

/// Search players by first or last name.
///
/// Queries shorter than the configured minimum return an empty list.
///
/// # Errors
///
/// - `400 Bad Request`: `q` missing or blank
pub async fn search_players(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PlayerSummary>>> {
    let q = query.q.ok_or(PlayerError::EmptyQuery).map_err(|e| player_error(&e))?;
    let found = state
        .player_manager
        .search(&q)
        .await
        .map_err(|e| player_error(&e))?;
    metrics::player_searches_total(found.len());
    Ok(Json(found))
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> ApiResult<Json<Player>> {
    state
        .player_manager
        .get_player(player_id)
        .await
        .map(Json)
        .map_err(|e| player_error(&e))
}

/// Win/loss record and frequent partners.
///
/// # Errors
///
/// - `404 Not Found`: Unknown player
pub async fn player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> ApiResult<Json<PlayerStatsResponse>> {
    let (player, stats) = state
        .player_manager
        .player_stats(player_id)
        .await
        .map_err(|e| player_error(&e))?;

    Ok(Json(PlayerStatsResponse {
        player,
        games_played: stats.games_played(),
        win_rate: stats.win_rate_display(),
        stats,
    }))
}
