//! Integration tests for magic-link sign-in
//!
//! A signed-in user's id doubles as their player id, so once a profile is
//! provisioned under that id the user can form teams.

use pickle_cup::auth::{AuthError, AuthManager, MemoryMailer};
use pickle_cup::db::MemoryStore;
use pickle_cup::player::Player;
use pickle_cup::team::{NewTeam, TeamError, TeamManager};
use std::sync::Arc;

const SECRET: &str = "integration-secret-with-more-than-32-chars";

fn setup() -> (Arc<MemoryStore>, Arc<MemoryMailer>, AuthManager) {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(MemoryMailer::new());
    let auth = AuthManager::new(
        store.clone(),
        store.clone(),
        mailer.clone(),
        SECRET.to_string(),
        "https://cup.test/auth/callback".to_string(),
    );
    (store, mailer, auth)
}

#[tokio::test]
async fn test_signed_in_user_needs_profile_to_form_team() {
    let (store, mailer, auth) = setup();
    let teams = TeamManager::new(store.clone(), store.clone());
    store.seed_player("Jamie", None, Some("jamie"));

    auth.sign_in_with_magic_link("toni@example.com").await.unwrap();
    let token = mailer.last_token_for("toni@example.com").unwrap();
    let session = auth.verify_magic_link(&token).await.unwrap();
    let user_id = session.user.id;

    let request = NewTeam {
        name: "Kitchen Sync".to_string(),
        partner_username: "jamie".to_string(),
    };
    let err = teams
        .create_team(user_id, request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, TeamError::ProfileRequired));

    store.insert_player(Player {
        id: user_id,
        first_name: "Toni".to_string(),
        last_name: None,
        username: Some("toni".to_string()),
    });
    let team = teams.create_team(user_id, request).await.unwrap();
    assert_eq!(team.player1_id, user_id);

    let mine = teams.teams_for_player(user_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Kitchen Sync");
}

#[tokio::test]
async fn test_tampered_token_is_not_a_user() {
    let (_store, mailer, auth) = setup();
    auth.sign_in_with_magic_link("max@example.com").await.unwrap();
    let token = mailer.last_token_for("max@example.com").unwrap();
    let session = auth.verify_magic_link(&token).await.unwrap();

    let mut tampered = session.access_token.clone();
    tampered.push('x');
    assert!(auth.get_current_user(&tampered).await.unwrap().is_none());
    assert!(matches!(
        auth.verify_access_token(&tampered),
        Err(AuthError::JwtError(_))
    ));
}

#[tokio::test]
async fn test_bad_email_sends_nothing() {
    let (_store, mailer, auth) = setup();
    let err = auth.sign_in_with_magic_link("not-an-email").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_token_is_invalid() {
    let (_store, _mailer, auth) = setup();
    let err = auth.verify_magic_link("deadbeef").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidMagicLink));
}
