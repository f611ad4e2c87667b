//! HTTP API for Pickle Cup.
//!
//! # Modules
//!
//! - [`auth`]: Magic-link sign-in, token refresh, sign-out
//! - [`players`]: Player search, profiles and stats
//! - [`teams`]: Team creation and listing for the signed-in player
//! - [`brackets`]: Bracket preview for a team selection
//! - [`tournaments`]: Tournament creation, listing and round-1 generation
//! - [`matches`]: Recent matches and result recording
//! - [`middleware`]: Bearer authentication and request metrics
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pc_server::api::{AppState, create_router};
//! use pc_server::config::ServerConfig;
//! use pickle_cup::auth::LogMailer;
//! use pickle_cup::db::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::new("0123456789abcdef0123456789abcdef".to_string());
//! let state = AppState::from_store(Arc::new(MemoryStore::new()), Arc::new(LogMailer), &config);
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind(config.bind).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod brackets;
pub mod errors;
pub mod matches;
pub mod middleware;
pub mod players;
pub mod rate_limiter;
pub mod request_id;
pub mod teams;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use pickle_cup::auth::{AuthManager, Mailer};
use pickle_cup::db::{HealthCheck, Store, with_timeout};
use pickle_cup::matches::MatchManager;
use pickle_cup::player::PlayerManager;
use pickle_cup::team::TeamManager;
use pickle_cup::tournament::TournamentManager;

use crate::config::ServerConfig;
use rate_limiter::MagicLinkThrottle;

pub use errors::{ApiError, ApiResult, ErrorResponse};

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub player_manager: Arc<PlayerManager>,
    pub team_manager: Arc<TeamManager>,
    pub tournament_manager: Arc<TournamentManager>,
    pub match_manager: Arc<MatchManager>,
    pub health: Arc<dyn HealthCheck>,
    pub magic_link_throttle: Arc<MagicLinkThrottle>,
    pub store_timeout: Duration,
}

impl AppState {
    /// Build every manager over one store
    ///
    /// # Arguments
    ///
    /// * `store` - PostgreSQL or in-memory store
    /// * `mailer` - Delivers magic links
    /// * `config` - Secrets, timeouts and search settings
    pub fn from_store<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, config: &ServerConfig) -> Self
    where
        S: Store + 'static,
    {
        let timeout = config.store_timeout();

        let auth_manager = AuthManager::new(
            store.clone(),
            store.clone(),
            mailer,
            config.security.jwt_secret.clone(),
            config.magic_link.redirect_url.clone(),
        )
        .with_magic_link_ttl(config.magic_link_ttl())
        .with_timeout(timeout);

        let player_manager = PlayerManager::new(store.clone(), store.clone())
            .with_min_query_len(config.search.min_query_len)
            .with_search_limit(config.search.limit)
            .with_timeout(timeout);

        Self {
            auth_manager: Arc::new(auth_manager),
            player_manager: Arc::new(player_manager),
            team_manager: Arc::new(
                TeamManager::new(store.clone(), store.clone()).with_timeout(timeout),
            ),
            tournament_manager: Arc::new(
                TournamentManager::new(store.clone(), store.clone(), store.clone())
                    .with_timeout(timeout),
            ),
            match_manager: Arc::new(
                MatchManager::new(store.clone(), store.clone()).with_timeout(timeout),
            ),
            health: store,
            magic_link_throttle: Arc::new(MagicLinkThrottle::per_hour(
                config.magic_link.max_per_hour,
            )),
            store_timeout: timeout,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                              - Health check (public)
/// POST /api/v1/auth/magic-link              - Email a sign-in link (public)
/// GET  /api/v1/auth/callback?token=         - Exchange link for tokens (public)
/// POST /api/v1/auth/refresh                 - Rotate tokens (public)
/// POST /api/v1/auth/sign-out                - End session (public)
/// GET  /api/v1/auth/me                      - Current user (auth required)
/// GET  /api/v1/players/search?q=            - Search players (public)
/// GET  /api/v1/players/{id}                 - Player profile (public)
/// GET  /api/v1/players/{id}/stats           - Player stats (public)
/// POST /api/v1/brackets/preview             - Preview pairing (public)
/// GET  /api/v1/tournaments                  - List tournaments (public)
/// GET  /api/v1/tournaments/{id}             - Tournament (public)
/// GET  /api/v1/tournaments/{id}/bracket     - Round-1 matches (public)
/// GET  /api/v1/teams                        - My teams (auth required)
/// POST /api/v1/teams                        - Create team (auth required)
/// POST /api/v1/tournaments                  - Create tournament (auth required)
/// POST /api/v1/tournaments/{id}/bracket     - Generate round 1 (auth required)
/// GET  /api/v1/matches                      - Recent matches (auth required)
/// POST /api/v1/matches/{id}/result          - Record winner (organizer only)
/// ```
///
/// ## Legacy Routes
/// ```text
/// GET  /api/players/search?q=               - Use /api/v1/players/search
/// GET  /api/players/{id}/stats              - Use /api/v1/players/{id}/stats
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .route("/api/players/search", get(players::search_players))
        .route("/api/players/{player_id}/stats", get(players::player_stats))
        .layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/magic-link", post(auth::request_magic_link))
        .route("/auth/callback", get(auth::magic_link_callback))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/players/search", get(players::search_players))
        .route("/players/{player_id}", get(players::get_player))
        .route("/players/{player_id}/stats", get(players::player_stats))
        .route("/brackets/preview", post(brackets::preview_bracket))
        .route("/tournaments", get(tournaments::list_tournaments))
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{tournament_id}/bracket",
            get(tournaments::get_bracket),
        );

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/teams", get(teams::my_teams).post(teams::create_team))
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{tournament_id}/bracket",
            post(tournaments::generate_bracket),
        )
        .route("/matches", get(matches::recent_matches))
        .route("/matches/{match_id}/result", post(matches::record_result))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers a ping within the store timeout,
/// `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.3.0","store":true,"timestamp":"2026-04-02T10:30:00+00:00"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match with_timeout(state.store_timeout, state.health.ping()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
