//! Team handlers. Both routes act on behalf of the signed-in player.

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};

use pickle_cup::auth::UserId;
use pickle_cup::team::{NewTeam, Team, TeamSummary};

use super::AppState;
use super::errors::{ApiResult, team_error};

/// Teams the signed-in player belongs to.
pub async fn my_teams(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> ApiResult<Json<Vec<TeamSummary>>> {
    state
        .team_manager
        .teams_for_player(user_id)
        .await
        .map(Json)
        .map_err(|e| team_error(&e))
}

/// Form a team with the player owning `partner_username`.
///
/// # Request Body
///
/// ```json
/// { "name": "Kitchen Kings", "partner_username": "jamie" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank name, no player profile, or self as partner
/// - `404 Not Found`: No player has that username
pub async fn create_team(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<NewTeam>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = state
        .team_manager
        .create_team(user_id, payload)
        .await
        .map_err(|e| team_error(&e))?;
    Ok((StatusCode::CREATED, Json(team)))
}
