//! Magic-link authentication handlers.
//!
//! # Examples
//!
//! Request a sign-in link:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/magic-link \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "sam@example.com"}'
//! ```
//!
//! Exchange the emailed token for a session:
//! ```bash
//! curl "http://localhost:8080/api/v1/auth/callback?token=<token>"
//! ```

use axum::{
    Json,
    extract::{Extension, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use pickle_cup::auth::{
    AuthError, MagicLinkRequest, RefreshRequest, SessionTokens, User, UserId, normalize_email,
};

use super::AppState;
use super::errors::{ApiResult, auth_error, error_response};
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct MagicLinkSent {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
}

/// Email a single-use sign-in link.
///
/// # Request Body
///
/// ```json
/// { "email": "sam@example.com" }
/// ```
///
/// # Response
///
/// `202 Accepted` once the link has been handed to the mailer.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email address
/// - `429 Too Many Requests`: Too many links requested for this address
pub async fn request_magic_link(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(payload): Json<MagicLinkRequest>,
) -> ApiResult<(StatusCode, Json<MagicLinkSent>)> {
    let email = normalize_email(&payload.email).map_err(|e| auth_error(&e))?;

    if !state.magic_link_throttle.check(&email) {
        metrics::rate_limit_hits_total("auth/magic-link");
        logging::log_security_event(
            "magic_link_throttled",
            Some(&email),
            &format!("Sign-in link limit reached (request {})", request_id.as_str()),
        );
        return Err(auth_error(&AuthError::RateLimited));
    }

    state
        .auth_manager
        .sign_in_with_magic_link(&email)
        .await
        .map_err(|e| auth_error(&e))?;
    metrics::magic_links_issued_total();

    Ok((
        StatusCode::ACCEPTED,
        Json(MagicLinkSent {
            message: "Check your email for the sign-in link".to_string(),
        }),
    ))
}

/// Exchange a magic-link token for session tokens.
///
/// # Errors
///
/// - `400 Bad Request`: No token in the query string
/// - `401 Unauthorized`: Token unknown, already used, or expired
pub async fn magic_link_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<SessionTokens>> {
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing sign-in token",
        ));
    };

    match state.auth_manager.verify_magic_link(token.trim()).await {
        Ok(tokens) => {
            metrics::sign_ins_total(true);
            Ok(Json(tokens))
        }
        Err(e) => {
            metrics::sign_ins_total(false);
            logging::log_security_event("magic_link_rejected", None, &e.to_string());
            Err(auth_error(&e))
        }
    }
}

/// Rotate a refresh token.
///
/// The old refresh token stops working; the response carries the new pair.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or already rotated refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<SessionTokens>> {
    state
        .auth_manager
        .refresh(&payload.refresh_token)
        .await
        .map(Json)
        .map_err(|e| auth_error(&e))
}

/// End the session behind a refresh token.
///
/// Unknown tokens are accepted so signing out twice is harmless. Access
/// tokens stay valid until they expire.
pub async fn sign_out(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth_manager
        .sign_out(&payload.refresh_token)
        .await
        .map_err(|e| auth_error(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user.
pub async fn me(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> ApiResult<Json<User>> {
    state
        .auth_manager
        .get_user(user_id)
        .await
        .map(Json)
        .map_err(|e| auth_error(&e))
}
