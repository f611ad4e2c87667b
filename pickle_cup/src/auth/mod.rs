//! Authentication module providing passwordless sign-in.
//!
//! This module implements:
//! - Magic links: a random single-use token emailed to the user, stored only as a SHA-256 hash
//! - JWT access tokens (15 minutes) and rotating refresh tokens (7 days)
//! - First sign-in creates the user
//!
//! ## Example
//!
//! ```no_run
//! use pickle_cup::auth::{AuthManager, LogMailer};
//! use pickle_cup::db::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let auth = AuthManager::new(
//!         store.clone(),
//!         store.clone(),
//!         Arc::new(LogMailer),
//!         "a-jwt-secret-of-at-least-thirty-two-chars".to_string(),
//!         "http://localhost:3000/auth/callback".to_string(),
//!     );
//!
//!     auth.sign_in_with_magic_link("player@example.com").await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod mailer;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use mailer::{LogMailer, Mailer, MemoryMailer};
pub use manager::{AuthManager, DEFAULT_MAGIC_LINK_TTL, normalize_email};
pub use models::{
    AccessTokenClaims, MagicLink, MagicLinkRequest, RefreshRequest, Session, SessionTokens, User,
    UserId,
};
