//! Mapping from domain errors to HTTP responses.
//!
//! Bodies are `{"error": "..."}`, plus a machine-readable `reason` for
//! rejected team selections. Messages come from each error's
//! `client_message()`, so database detail never reaches the client.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use pickle_cup::auth::AuthError;
use pickle_cup::bracket::BracketError;
use pickle_cup::db::StoreError;
use pickle_cup::matches::MatchError;
use pickle_cup::player::PlayerError;
use pickle_cup::team::TeamError;
use pickle_cup::tournament::TournamentError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response with no reason code
pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            reason: None,
        }),
    )
}

fn logged(status: StatusCode, detail: &dyn std::fmt::Display, message: String) -> ApiError {
    if status.is_server_error() {
        tracing::error!(status = %status, "Request failed: {}", detail);
    }
    error_response(status, message)
}

pub fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_error(error: &AuthError) -> ApiError {
    let status = match error {
        AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthError::InvalidMagicLink
        | AuthError::MagicLinkExpired
        | AuthError::JwtError(_)
        | AuthError::InvalidRefreshToken
        | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AuthError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
        AuthError::Store(e) => store_status(e),
    };
    logged(status, error, error.client_message())
}

pub fn bracket_error(error: &BracketError) -> ApiError {
    let status = match error {
        BracketError::Validation(_) => StatusCode::BAD_REQUEST,
        BracketError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        BracketError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    let (status, Json(mut body)) = logged(status, error, error.client_message());
    body.reason = error.reason_code().map(str::to_string);
    (status, Json(body))
}

pub fn player_error(error: &PlayerError) -> ApiError {
    let status = match error {
        PlayerError::EmptyQuery => StatusCode::BAD_REQUEST,
        PlayerError::NotFound(_) => StatusCode::NOT_FOUND,
        PlayerError::Store(e) => store_status(e),
    };
    logged(status, error, error.client_message())
}

pub fn team_error(error: &TeamError) -> ApiError {
    let status = match error {
        TeamError::Validation(_) | TeamError::ProfileRequired | TeamError::SelfPartner => {
            StatusCode::BAD_REQUEST
        }
        TeamError::PartnerNotFound(_) | TeamError::TeamNotFound(_) => StatusCode::NOT_FOUND,
        TeamError::Bracket(e) => return bracket_error(e),
        TeamError::Store(e) => store_status(e),
    };
    logged(status, error, error.client_message())
}

pub fn tournament_error(error: &TournamentError) -> ApiError {
    let status = match error.root() {
        TournamentError::InvalidName(_) => StatusCode::BAD_REQUEST,
        TournamentError::NotFound(_) => StatusCode::NOT_FOUND,
        TournamentError::NotCreator => StatusCode::FORBIDDEN,
        TournamentError::BracketExists => StatusCode::CONFLICT,
        TournamentError::Team(e) => return team_error(e),
        TournamentError::Bracket(e) => return bracket_error(e),
        TournamentError::Store(e) => store_status(e),
        TournamentError::CreationAborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    logged(status, error, error.client_message())
}

pub fn match_error(error: &MatchError) -> ApiError {
    let status = match error {
        MatchError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchError::InvalidWinner => StatusCode::BAD_REQUEST,
        MatchError::NotOrganizer => StatusCode::FORBIDDEN,
        MatchError::AlreadyDecided => StatusCode::CONFLICT,
        MatchError::Store(e) => store_status(e),
    };
    logged(status, error, error.client_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickle_cup::bracket::ValidationReason;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let (status, Json(body)) =
            player_error(&PlayerError::Store(StoreError::Timeout(Duration::from_secs(5))));
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body.error, "Request timed out");
    }

    #[test]
    fn test_validation_carries_reason() {
        let err = BracketError::Validation(ValidationReason::OddTeamCount);
        let (status, Json(body)) = bracket_error(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.reason.as_deref(), Some("odd_team_count"));
    }

    #[test]
    fn test_aborted_creation_maps_by_root_cause() {
        let err = TournamentError::CreationAborted {
            rolled_back: true,
            source: Box::new(TournamentError::Bracket(BracketError::Timeout(
                Duration::from_secs(10),
            ))),
        };
        let (status, Json(body)) = tournament_error(&err);
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body.reason.is_none());
    }

    #[test]
    fn test_persistence_detail_not_exposed() {
        let err = BracketError::Persistence {
            attempted: 4,
            persisted: 2,
            message: "relation \"matches\" does not exist".to_string(),
        };
        let (status, Json(body)) = bracket_error(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("relation"));
    }

    #[test]
    fn test_team_and_match_statuses() {
        assert_eq!(
            team_error(&TeamError::PartnerNotFound("ghost".to_string())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(team_error(&TeamError::SelfPartner).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            match_error(&MatchError::NotFound(Uuid::new_v4())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            tournament_error(&TournamentError::NotCreator).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            auth_error(&AuthError::RateLimited).0,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_reason_omitted_from_json_when_absent() {
        let (_, Json(body)) = error_response(StatusCode::NOT_FOUND, "Player not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Player not found" }));
    }
}
