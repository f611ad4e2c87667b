//! Bracket preview.
//!
//! Pairs a selection exactly as tournament creation would, without writing
//! anything, so the front end can show the draw while teams are picked.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use pickle_cup::bracket::{Matchup, render_bracket};
use pickle_cup::team::TeamId;

use super::AppState;
use super::errors::{ApiResult, team_error};

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub team_ids: Vec<TeamId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub matchups: Vec<Matchup>,
    /// Plain-text rendering of the draw
    pub rendered: String,
}

/// Pair the selected teams in order.
///
/// # Errors
///
/// - `400 Bad Request`: `{error, reason}` with reason `too_few_teams`,
///   `odd_team_count` or `duplicate_team`
/// - `404 Not Found`: Unknown team id
pub async fn preview_bracket(
    State(state): State<AppState>,
    Json(payload): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let matchups = state
        .team_manager
        .preview_bracket(&payload.team_ids)
        .await
        .map_err(|e| team_error(&e))?;

    Ok(Json(PreviewResponse {
        rendered: render_bracket(&matchups),
        matchups,
    }))
}
