//! Match listing and result handlers.

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use pickle_cup::auth::UserId;
use pickle_cup::matches::{DEFAULT_RECENT_LIMIT, Match, MatchId, MatchSummary, RecordResultRequest};

use super::AppState;
use super::errors::{ApiResult, match_error};

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Most recent matches, newest first; `limit` is capped at 50.
pub async fn recent_matches(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<MatchSummary>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(DEFAULT_RECENT_LIMIT);
    state
        .match_manager
        .recent_matches(limit)
        .await
        .map(Json)
        .map_err(|e| match_error(&e))
}

/// Record the winner of a match. Tournament matches are decided by the organizer.
///
/// # Errors
///
/// - `400 Bad Request`: Winner is not one of the match's teams
/// - `403 Forbidden`: Caller did not create the match's tournament
/// - `404 Not Found`: Unknown match
/// - `409 Conflict`: A winner is already recorded
pub async fn record_result(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<RecordResultRequest>,
) -> ApiResult<Json<Match>> {
    state
        .match_manager
        .record_result(user_id, match_id, payload.winner_team_id)
        .await
        .map(Json)
        .map_err(|e| match_error(&e))
}
