//! Authentication manager implementation.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    errors::{AuthError, AuthResult},
    mailer::Mailer,
    models::{AccessTokenClaims, SessionTokens, User, UserId},
};
use crate::db::{DEFAULT_QUERY_TIMEOUT, SessionRepository, StoreError, UserRepository, with_timeout};

/// Default magic link lifetime
pub const DEFAULT_MAGIC_LINK_TTL: std::time::Duration = std::time::Duration::from_secs(15 * 60);

const MAX_EMAIL_LEN: usize = 254;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    mailer: Arc<dyn Mailer>,
    jwt_secret: String,
    redirect_url: String,
    magic_link_ttl: Duration,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
    timeout: std::time::Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User persistence
    /// * `sessions` - Magic link and refresh-token persistence
    /// * `mailer` - Link delivery
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `redirect_url` - Page the emailed link points to; `token` is appended
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        mailer: Arc<dyn Mailer>,
        jwt_secret: String,
        redirect_url: String,
    ) -> Self {
        Self {
            users,
            sessions,
            mailer,
            jwt_secret,
            redirect_url,
            magic_link_ttl: Duration::minutes(15),
            access_token_duration: Duration::minutes(15),
            refresh_token_duration: Duration::days(7),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// How long an emailed link stays valid
    pub fn with_magic_link_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.magic_link_ttl = Duration::from_std(ttl).unwrap_or(self.magic_link_ttl);
        self
    }

    /// Timeout applied to every store call
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Email a single-use sign-in link
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Address malformed
    /// * `AuthError::DeliveryFailed` - Mailer could not send the link
    pub async fn sign_in_with_magic_link(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email)?;

        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);
        let token = hex::encode(bytes);
        let expires_at = Utc::now() + self.magic_link_ttl;

        with_timeout(
            self.timeout,
            self.sessions
                .store_magic_link(&hash_token(&token), &email, expires_at),
        )
        .await?;

        let link = self.link_for(&token);
        self.mailer.send_magic_link(&email, &link).await?;
        log::info!("Magic link issued for {}", email);
        Ok(())
    }

    fn link_for(&self, token: &str) -> String {
        let separator = if self.redirect_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{}token={}", self.redirect_url, separator, token)
    }

    /// Exchange a magic link token for a session
    ///
    /// Creates the user on first sign-in.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidMagicLink` - Token unknown or already used
    /// * `AuthError::MagicLinkExpired` - Token past its expiry
    pub async fn verify_magic_link(&self, token: &str) -> AuthResult<SessionTokens> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidMagicLink);
        }

        let link = with_timeout(
            self.timeout,
            self.sessions.consume_magic_link(&hash_token(token)),
        )
        .await?
        .ok_or(AuthError::InvalidMagicLink)?;
        if link.is_expired(Utc::now()) {
            return Err(AuthError::MagicLinkExpired);
        }

        let user = self.find_or_create_user(&link.email).await?;
        with_timeout(self.timeout, self.users.touch_last_sign_in(user.id)).await?;
        log::info!("User {} signed in", user.id);

        self.create_session(user).await
    }

    async fn find_or_create_user(&self, email: &str) -> AuthResult<User> {
        if let Some(user) =
            with_timeout(self.timeout, self.users.find_user_by_email(email)).await?
        {
            return Ok(user);
        }

        match with_timeout(self.timeout, self.users.create_user(email)).await {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent first sign-in
            Err(StoreError::Conflict(_)) => {
                with_timeout(self.timeout, self.users.find_user_by_email(email))
                    .await?
                    .ok_or(AuthError::UserNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new session with access and refresh tokens
    async fn create_session(&self, user: User) -> AuthResult<SessionTokens> {
        let access_token = self.generate_access_token(&user)?;
        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.refresh_token_duration;

        with_timeout(
            self.timeout,
            self.sessions
                .create_session(&refresh_token, user.id, expires_at),
        )
        .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Refresh access token using refresh token; the old refresh token is revoked
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidRefreshToken` - Refresh token not found
    /// * `AuthError::SessionExpired` - Refresh token expired
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let session = with_timeout(self.timeout, self.sessions.find_session(refresh_token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if session.expires_at < Utc::now() {
            with_timeout(self.timeout, self.sessions.delete_session(refresh_token)).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self.get_user(session.user_id).await?;

        // Rotation
        with_timeout(self.timeout, self.sessions.delete_session(refresh_token)).await?;
        self.create_session(user).await
    }

    /// Sign out by deleting the refresh-token session; unknown tokens are ignored
    pub async fn sign_out(&self, refresh_token: &str) -> AuthResult<()> {
        let existed =
            with_timeout(self.timeout, self.sessions.delete_session(refresh_token)).await?;
        if existed {
            log::info!("Session signed out");
        }
        Ok(())
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// User behind an access token, or `None` when the token is invalid
    pub async fn get_current_user(&self, access_token: &str) -> AuthResult<Option<User>> {
        let claims = match self.verify_access_token(access_token) {
            Ok(claims) => claims,
            Err(AuthError::JwtError(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(with_timeout(self.timeout, self.users.find_user(claims.sub)).await?)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: UserId) -> AuthResult<User> {
        with_timeout(self.timeout, self.users.find_user(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Generate JWT access token
    fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id,
            email: user.email.clone(),
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }
}

/// SHA-256 of a magic link token, hex encoded
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Trim and lower-case an address, rejecting anything that is not `local@domain.tld`
pub fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(AuthError::InvalidEmail)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok {
        return Err(AuthError::InvalidEmail);
    }

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryMailer;
    use crate::db::MemoryStore;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    fn setup(redirect: &str) -> (Arc<MemoryStore>, Arc<MemoryMailer>, AuthManager) {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(MemoryMailer::new());
        let manager = AuthManager::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            SECRET.to_string(),
            redirect.to_string(),
        );
        (store, mailer, manager)
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Casey@Example.COM ").unwrap(),
            "casey@example.com"
        );
        for bad in ["", "casey", "@example.com", "casey@", "casey@example", "a b@c.de", "a@b@c.de"] {
            assert!(
                matches!(normalize_email(bad), Err(AuthError::InvalidEmail)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, "abc");
        assert_eq!(hash, hash_token("abc"));
    }

    #[tokio::test]
    async fn test_link_appends_token() {
        let (_store, mailer, manager) = setup("https://cup.test/auth/callback");
        manager
            .sign_in_with_magic_link("drew@example.com")
            .await
            .unwrap();
        let link = mailer.last_link_for("drew@example.com").unwrap();
        assert!(link.starts_with("https://cup.test/auth/callback?token="));

        let (_store, mailer, manager) = setup("https://cup.test/auth?next=/teams");
        manager
            .sign_in_with_magic_link("drew@example.com")
            .await
            .unwrap();
        let link = mailer.last_link_for("drew@example.com").unwrap();
        assert!(link.starts_with("https://cup.test/auth?next=/teams&token="));
    }

    #[tokio::test]
    async fn test_magic_link_round_trip() {
        let (_store, mailer, manager) = setup("https://cup.test/cb");
        manager
            .sign_in_with_magic_link("Quinn@Example.com")
            .await
            .unwrap();
        let token = mailer.last_token_for("quinn@example.com").unwrap();
        assert_eq!(token.len(), 64);

        let tokens = manager.verify_magic_link(&token).await.unwrap();
        assert_eq!(tokens.user.email, "quinn@example.com");

        let claims = manager.verify_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, tokens.user.id);

        let current = manager
            .get_current_user(&tokens.access_token)
            .await
            .unwrap();
        assert_eq!(current.map(|u| u.id), Some(tokens.user.id));

        let err = manager.verify_magic_link(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidMagicLink));
    }

    #[tokio::test]
    async fn test_second_sign_in_reuses_user() {
        let (_store, mailer, manager) = setup("https://cup.test/cb");
        let mut ids = Vec::new();
        for _ in 0..2 {
            manager
                .sign_in_with_magic_link("rae@example.com")
                .await
                .unwrap();
            let token = mailer.last_token_for("rae@example.com").unwrap();
            ids.push(manager.verify_magic_link(&token).await.unwrap().user.id);
        }
        assert_eq!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn test_expired_link_rejected() {
        let (_store, mailer, manager) = setup("https://cup.test/cb");
        let manager = manager.with_magic_link_ttl(std::time::Duration::ZERO);
        manager
            .sign_in_with_magic_link("sky@example.com")
            .await
            .unwrap();
        let token = mailer.last_token_for("sky@example.com").unwrap();

        let err = manager.verify_magic_link(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::MagicLinkExpired));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_sign_out_is_idempotent() {
        let (_store, mailer, manager) = setup("https://cup.test/cb");
        manager
            .sign_in_with_magic_link("lee@example.com")
            .await
            .unwrap();
        let token = mailer.last_token_for("lee@example.com").unwrap();
        let first = manager.verify_magic_link(&token).await.unwrap();

        let second = manager.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        let err = manager.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken));

        manager.sign_out(&second.refresh_token).await.unwrap();
        manager.sign_out(&second.refresh_token).await.unwrap();
        assert!(matches!(
            manager.refresh(&second.refresh_token).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_garbage_access_token_has_no_user() {
        let (_store, _mailer, manager) = setup("https://cup.test/cb");
        assert!(manager.get_current_user("not-a-jwt").await.unwrap().is_none());
    }
}
