//! Process-wide session cache.
//!
//! The signed-in session lives in one place. The API client reads its bearer
//! token from here, and anything that displays sign-in state subscribes
//! instead of asking the server again.

use pickle_cup::auth::{SessionTokens, User};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

/// Shared, observable session state
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct SessionCache {
    state: Arc<watch::Sender<Option<SessionTokens>>>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    /// A cache with nobody signed in
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// The cache shared by the whole process
    pub fn global() -> &'static SessionCache {
        static GLOBAL: OnceLock<SessionCache> = OnceLock::new();
        GLOBAL.get_or_init(SessionCache::new)
    }

    pub fn current(&self) -> Option<SessionTokens> {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.refresh_token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Receiver that sees every later sign-in and sign-out
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionTokens>> {
        self.state.subscribe()
    }

    /// Store a new or rotated session and notify subscribers
    pub fn sign_in(&self, session: SessionTokens) {
        self.state.send_replace(Some(session));
    }

    /// Forget the session, returning it; subscribers are notified even if
    /// nobody was signed in
    pub fn sign_out(&self) -> Option<SessionTokens> {
        self.state.send_replace(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn session(email: &str) -> SessionTokens {
        SessionTokens {
            access_token: format!("access-{email}"),
            refresh_token: format!("refresh-{email}"),
            user: User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                created_at: Utc::now(),
                last_sign_in: None,
            },
        }
    }

    #[test]
    fn test_starts_signed_out() {
        let cache = SessionCache::new();
        assert!(!cache.is_signed_in());
        assert!(cache.access_token().is_none());
        assert!(cache.user().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SessionCache::new();
        let other = cache.clone();
        cache.sign_in(session("a@b.co"));

        assert_eq!(other.access_token().as_deref(), Some("access-a@b.co"));
        assert_eq!(other.sign_out().unwrap().user.email, "a@b.co");
        assert!(!cache.is_signed_in());
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let cache = SessionCache::new();
        let mut rx = cache.subscribe();

        cache.sign_in(session("sub@example.com"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|s| s.user.email.clone()),
            Some("sub@example.com".to_string())
        );

        cache.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(SessionCache::global(), SessionCache::global()));
    }
}
