//! Integration tests for the API client against a live in-memory server.

use pc_client::api_client::ApiClient;
use pc_client::display;
use pc_client::session::SessionCache;
use pc_server::api::{AppState, create_router};
use pc_server::config::ServerConfig;
use pickle_cup::auth::MemoryMailer;
use pickle_cup::db::{MemoryStore, TeamRepository};
use pickle_cup::player::Player;
use pickle_cup::team::TeamId;
use pickle_cup::tournament::TournamentStructure;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct LiveServer {
    base_url: String,
    store: Arc<MemoryStore>,
    mailer: Arc<MemoryMailer>,
}

async fn start_server() -> LiveServer {
    let mut config = ServerConfig::new("client_test_secret_key_0123456789abc".to_string());
    config.magic_link.redirect_url = "https://cup.test/auth/callback".to_string();

    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState::from_store(store.clone(), mailer.clone(), &config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    LiveServer {
        base_url: format!("http://{addr}"),
        store,
        mailer,
    }
}

impl LiveServer {
    fn client(&self) -> ApiClient {
        ApiClient::with_session(self.base_url.clone(), SessionCache::new())
    }

    /// Sign the client in and give the user a player profile
    async fn sign_in(&self, client: &ApiClient, email: &str, username: &str) -> Uuid {
        client.request_magic_link(email).await.unwrap();
        let token = self.mailer.last_token_for(email).unwrap();
        let user = client.complete_sign_in(&token).await.unwrap();
        self.store.insert_player(Player {
            id: user.id,
            first_name: username.to_string(),
            last_name: None,
            username: Some(username.to_string()),
        });
        user.id
    }

    async fn seed_teams(&self, names: &[&str]) -> Vec<TeamId> {
        let mut ids = Vec::new();
        for name in names {
            let a = self.store.seed_player(&format!("{name} One"), None, None);
            let b = self.store.seed_player(&format!("{name} Two"), None, None);
            ids.push(self.store.create_team(name, a.id, b.id).await.unwrap().id);
        }
        ids
    }
}

// ============================================================================
// Network Error Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_connection_refused() {
    let client = ApiClient::with_session("http://localhost:19999".to_string(), SessionCache::new());

    let result = client.request_magic_link("someone@example.com").await;

    assert!(result.is_err(), "Should fail when server is not available");
    let error_msg = result.unwrap_err().to_string();
    assert!(
        error_msg.contains("Failed to send sign-in link request"),
        "Error should indicate connection failure: {error_msg}"
    );
}

#[tokio::test]
async fn test_short_search_makes_no_request() {
    // Nothing listens here; a request would fail
    let client = ApiClient::with_session("http://localhost:19999".to_string(), SessionCache::new());

    assert!(client.search_players("a").await.unwrap().is_empty());
    assert!(client.search_players("   ").await.unwrap().is_empty());
    assert!(client.search_players("ada").await.is_err());
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_sign_in_updates_session_cache() {
    let server = start_server().await;
    let client = server.client();
    let mut rx = client.session().subscribe();

    let user_id = server.sign_in(&client, "ada@example.com", "ada").await;

    rx.changed().await.unwrap();
    assert_eq!(
        rx.borrow_and_update().as_ref().map(|s| s.user.id),
        Some(user_id)
    );
    assert_eq!(client.current_user().await.unwrap().email, "ada@example.com");
}

#[tokio::test]
async fn test_refresh_rotates_cached_tokens() {
    let server = start_server().await;
    let client = server.client();
    server.sign_in(&client, "rot@example.com", "rot").await;
    let before = client.session().refresh_token().unwrap();

    client.refresh().await.unwrap();

    let after = client.session().refresh_token().unwrap();
    assert_ne!(before, after);
    assert!(client.my_teams().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_out_clears_session_and_notifies() {
    let server = start_server().await;
    let client = server.client();
    server.sign_in(&client, "bye@example.com", "bye").await;
    let mut rx = client.session().subscribe();

    client.sign_out().await.unwrap();

    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_none());
    assert!(!client.session().is_signed_in());
    assert_eq!(client.my_teams().await.unwrap_err().to_string(), "Not signed in");

    // Signing out again is a no-op
    client.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_reused_link_reports_server_message() {
    let server = start_server().await;
    let client = server.client();
    client.request_magic_link("once@example.com").await.unwrap();
    let token = server.mailer.last_token_for("once@example.com").unwrap();
    client.complete_sign_in(&token).await.unwrap();

    let err = client.complete_sign_in(&token).await.unwrap_err();
    assert!(err.to_string().starts_with("Sign-in failed (401"), "{err}");
}

// ============================================================================
// Player Tests
// ============================================================================

#[tokio::test]
async fn test_search_and_stats() {
    let server = start_server().await;
    let client = server.client();
    let rookie = server.store.seed_player("Rookie", Some("Rivera"), None);

    let found = client.search_players("rook").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, rookie.id);

    let stats = client.player_stats(rookie.id).await.unwrap();
    assert_eq!(stats.games_played, 0);
    assert!(display::player_stats(&stats).contains("Win rate: N/A"));
}

#[tokio::test]
async fn test_unknown_player_error_message() {
    let server = start_server().await;
    let client = server.client();

    let err = client.player_stats(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Player stats failed (404 Not Found): Player not found"
    );
}

// ============================================================================
// Team and Tournament Tests
// ============================================================================

#[tokio::test]
async fn test_create_team_and_list() {
    let server = start_server().await;
    let client = server.client();
    server.sign_in(&client, "cap@example.com", "cap").await;
    server.store.seed_player("Partner", None, Some("pat"));

    let team = client.create_team("Net Ninjas", "pat").await.unwrap();
    let teams = client.my_teams().await.unwrap();

    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].id, team.id);
    assert!(display::team_list(&teams).contains("Net Ninjas (cap & pat)"));
}

#[tokio::test]
async fn test_preview_rejects_odd_selection_with_reason() {
    let server = start_server().await;
    let client = server.client();
    let ids = server.seed_teams(&["A", "B", "C"]).await;

    let err = client.preview_bracket(&ids).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("400"), "{msg}");
    assert!(msg.ends_with("[odd_team_count]"), "{msg}");
}

#[tokio::test]
async fn test_tournament_bracket_round_trip() {
    let server = start_server().await;
    let client = server.client();
    server.sign_in(&client, "host@example.com", "host").await;
    let ids = server.seed_teams(&["Dinkers", "Lobsters", "Volleys", "Kitchen"]).await;

    let created = client
        .create_tournament("Spring Open", TournamentStructure::SingleElimination, &ids)
        .await
        .unwrap();
    assert_eq!(created.matches_created, 2);

    let listed = client.list_tournaments().await.unwrap();
    assert!(listed.iter().any(|t| t.id == created.tournament.id));

    let view = client.get_bracket(created.tournament.id).await.unwrap();
    assert_eq!(view.matches.len(), 2);
    assert_eq!(view.matches[0].team1.name, "Dinkers");
    assert_eq!(view.matches[1].team2.name, "Kitchen");

    let rendered = display::bracket(&view);
    assert!(rendered.starts_with("Spring Open"));
    assert!(rendered.contains("Match 2"));

    let winner = view.matches[0].team2.id;
    let recorded = client
        .record_result(view.matches[0].id, winner)
        .await
        .unwrap();
    assert_eq!(recorded.winner_team_id, Some(winner));

    let err = client
        .record_result(view.matches[0].id, view.matches[0].team1.id)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("409"), "{err}");

    let recent = client.recent_matches().await.unwrap();
    assert!(display::match_list(&recent).contains("winner: Lobsters"));
}

#[tokio::test]
async fn test_generate_bracket_for_existing_tournament() {
    let server = start_server().await;
    let client = server.client();
    server.sign_in(&client, "seed@example.com", "seed").await;
    let ids = server.seed_teams(&["A", "B"]).await;

    let created = client
        .create_tournament("Fall Classic", TournamentStructure::DoubleElimination, &[])
        .await
        .unwrap();
    assert_eq!(created.matches_created, 0);

    let count = tokio::time::timeout(
        Duration::from_secs(5),
        client.generate_bracket(created.tournament.id, &ids),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(count, 1);

    let err = client
        .generate_bracket(created.tournament.id, &ids)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("409"), "{err}");
}
