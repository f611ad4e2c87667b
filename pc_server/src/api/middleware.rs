//! Authentication and metrics middleware.
//!
//! # Extracting User ID
//!
//! Protected handlers read the signed-in user from request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use pickle_cup::auth::UserId;
//!
//! async fn protected_handler(Extension(user_id): Extension<UserId>) -> String {
//!     format!("Signed in as {}", user_id)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

use super::AppState;
use super::errors::{auth_error, error_response};
use crate::{logging, metrics};

/// Validate the bearer access token and inject the user ID.
///
/// # Behavior
///
/// - **Success**: Injects `UserId` into request extensions and calls the next handler
/// - **Missing or malformed header**: `401 Unauthorized`
/// - **Invalid/expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return error_response(StatusCode::UNAUTHORIZED, "Sign in required").into_response();
    };

    match state.auth_manager.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            next.run(request).await
        }
        Err(e) => auth_error(&e).into_response(),
    }
}

/// Record count and latency of every request, labelled by matched route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, elapsed.as_secs_f64() * 1000.0);
    logging::log_api_request(&method, &path, status, elapsed.as_millis() as u64);

    response
}
