//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Email address malformed
    #[error("Invalid email address")]
    InvalidEmail,

    /// Magic link unknown or already used
    #[error("Invalid or already used sign-in link")]
    InvalidMagicLink,

    /// Magic link past its expiry
    #[error("Sign-in link expired")]
    MagicLinkExpired,

    /// JWT token error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// Invalid refresh token
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Session expired
    #[error("Session expired")]
    SessionExpired,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Rate limited
    #[error("Too many sign-in requests, please try again later")]
    RateLimited,

    /// Mailer could not deliver the link
    #[error("Failed to deliver sign-in link: {0}")]
    DeliveryFailed(String),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Store(e) => e.client_message(),
            AuthError::JwtError(_) => "Authentication failed".to_string(),
            AuthError::DeliveryFailed(_) => "Failed to deliver sign-in link".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
