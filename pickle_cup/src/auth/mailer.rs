//! Magic link delivery.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::errors::AuthResult;

/// Delivers sign-in links to users
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `link` to `email`
    ///
    /// # Errors
    ///
    /// * `AuthError::DeliveryFailed` - The link could not be sent
    async fn send_magic_link(&self, email: &str, link: &str) -> AuthResult<()>;
}

/// Writes links to the log instead of sending mail; for development
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_magic_link(&self, email: &str, link: &str) -> AuthResult<()> {
        log::info!("Sign-in link for {}: {}", email, link);
        Ok(())
    }
}

/// Keeps every sent link in memory so tests can follow them
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(email, link)` pairs sent so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent link sent to `email`
    pub fn last_link_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
    }

    /// Token parameter of the most recent link sent to `email`
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        let link = self.last_link_for(email)?;
        let (_, query) = link.split_once('?')?;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("token="))
            .map(str::to_string)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_magic_link(&self, email: &str, link: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_mailer_extracts_token() {
        let mailer = MemoryMailer::new();
        mailer
            .send_magic_link("kai@example.com", "https://cup.test/auth?next=/&token=abc123")
            .await
            .unwrap();

        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(
            mailer.last_token_for("kai@example.com").as_deref(),
            Some("abc123")
        );
        assert!(mailer.last_link_for("nobody@example.com").is_none());
    }
}
