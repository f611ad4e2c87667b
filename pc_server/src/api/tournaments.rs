//! Tournament handlers.
//!
//! A tournament can be created with its first round in one request (pass
//! `team_ids`) or empty and seeded later through the bracket route.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use pickle_cup::auth::UserId;
use pickle_cup::team::TeamId;
use pickle_cup::tournament::{
    BracketView, CreatedTournament, NewTournament, Tournament, TournamentId, TournamentStructure,
};

use super::AppState;
use super::errors::{ApiResult, tournament_error};
use crate::metrics;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTournamentPayload {
    pub name: String,
    #[serde(default)]
    pub structure: TournamentStructure,
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateBracketPayload {
    pub team_ids: Vec<TeamId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BracketCreated {
    pub created: usize,
}

pub async fn list_tournaments(State(state): State<AppState>) -> ApiResult<Json<Vec<Tournament>>> {
    state
        .tournament_manager
        .list_tournaments()
        .await
        .map(Json)
        .map_err(|e| tournament_error(&e))
}

/// Create a tournament, optionally seeding round 1.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Spring Open",
///   "structure": "double_elimination",
///   "team_ids": ["...", "...", "...", "..."]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid name or team selection; nothing is kept
/// - `404 Not Found`: Unknown team id
/// - `500`/`504`: A write failed after the tournament row existed; it was deleted again
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<CreateTournamentPayload>,
) -> ApiResult<(StatusCode, Json<CreatedTournament>)> {
    let request = NewTournament::new(payload.name, payload.structure);

    let result = if payload.team_ids.is_empty() {
        state
            .tournament_manager
            .create_tournament(user_id, request)
            .await
            .map(|tournament| CreatedTournament {
                tournament,
                matches_created: 0,
            })
    } else {
        state
            .tournament_manager
            .create_with_bracket(user_id, request, &payload.team_ids)
            .await
    };
    let created = result.map_err(|e| tournament_error(&e))?;

    if created.matches_created > 0 {
        metrics::bracket_matches_committed(created.matches_created);
    }
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<Tournament>> {
    state
        .tournament_manager
        .get_tournament(tournament_id)
        .await
        .map(Json)
        .map_err(|e| tournament_error(&e))
}

/// Tournament with its round-1 matches in bracket order.
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> ApiResult<Json<BracketView>> {
    state
        .tournament_manager
        .get_bracket(tournament_id)
        .await
        .map(Json)
        .map_err(|e| tournament_error(&e))
}

/// Generate round 1 for an existing tournament.
///
/// # Errors
///
/// - `403 Forbidden`: Caller did not create the tournament
/// - `409 Conflict`: Round 1 already exists
pub async fn generate_bracket(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
    Json(payload): Json<GenerateBracketPayload>,
) -> ApiResult<(StatusCode, Json<BracketCreated>)> {
    let created = state
        .tournament_manager
        .generate_bracket(user_id, tournament_id, &payload.team_ids)
        .await
        .map_err(|e| tournament_error(&e))?;

    metrics::bracket_matches_committed(created);
    Ok((StatusCode::CREATED, Json(BracketCreated { created })))
}
