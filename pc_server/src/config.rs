//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use pickle_cup::db::DatabaseConfig;
use pickle_cup::player::{DEFAULT_MIN_QUERY_LEN, MAX_SEARCH_RESULTS};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// Page the emailed sign-in link points to by default
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/auth/callback";

const MIN_JWT_SECRET_LEN: usize = 32;

/// Upper bound for `STORE_TIMEOUT_SECS`
pub const MAX_STORE_TIMEOUT_SECS: u64 = 300;

/// Longest a sign-in link may stay valid
pub const MAX_MAGIC_LINK_TTL_SECS: u64 = 24 * 60 * 60;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Serve from the in-memory store instead of PostgreSQL
    pub use_memory_store: bool,
    /// Security configuration
    pub security: SecurityConfig,
    /// Magic-link sign-in configuration
    pub magic_link: MagicLinkConfig,
    /// Player search configuration
    pub search: SearchConfig,
    /// Timeout applied to each store call, in seconds
    pub store_timeout_secs: u64,
    /// Prometheus listener; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
}

/// Magic-link configuration
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// Page the emailed link points to
    pub redirect_url: String,
    /// Link lifetime in seconds
    pub ttl_secs: u64,
    /// Links one address may request per hour
    pub max_per_hour: usize,
}

/// Player search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Shorter queries return nothing
    pub min_query_len: usize,
    /// Maximum results per search
    pub limit: usize,
}

impl ServerConfig {
    /// Configuration with every optional setting at its default
    pub fn new(jwt_secret: String) -> Self {
        Self {
            bind: DEFAULT_BIND,
            database: DatabaseConfig::development(),
            use_memory_store: false,
            security: SecurityConfig { jwt_secret },
            magic_link: MagicLinkConfig {
                redirect_url: DEFAULT_REDIRECT_URL.to_string(),
                ttl_secs: 15 * 60,
                max_per_hour: 5,
            },
            search: SearchConfig {
                min_query_len: DEFAULT_MIN_QUERY_LEN,
                limit: MAX_SEARCH_RESULTS,
            },
            store_timeout_secs: 5,
            metrics_bind: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `memory_store` - Serve from the in-memory store (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `JWT_SECRET` is missing or too short, or an address
    /// variable does not parse
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        memory_store: bool,
    ) -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        let mut config = Self::new(jwt_secret);

        config.bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr_env("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        config.database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            config.database.database_url = url;
        }
        config.use_memory_store = memory_store || parse_env_or("USE_MEMORY_STORE", false);

        if let Ok(url) = std::env::var("MAGIC_LINK_REDIRECT_URL") {
            config.magic_link.redirect_url = url;
        }
        config.magic_link.ttl_secs = parse_env_or("MAGIC_LINK_TTL_SECS", config.magic_link.ttl_secs);
        config.magic_link.max_per_hour =
            parse_env_or("MAGIC_LINK_MAX_PER_HOUR", config.magic_link.max_per_hour);

        config.search.min_query_len =
            parse_env_or("SEARCH_MIN_QUERY_LEN", config.search.min_query_len);
        config.search.limit = parse_env_or("SEARCH_LIMIT", config.search.limit);

        config.store_timeout_secs = parse_env_or("STORE_TIMEOUT_SECS", config.store_timeout_secs);
        config.metrics_bind = parse_addr_env("METRICS_BIND")?;

        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first setting that is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        if self.search.limit == 0 || self.search.limit > MAX_SEARCH_RESULTS {
            return Err(ConfigError::Invalid {
                var: "SEARCH_LIMIT".to_string(),
                reason: format!("Must be between 1 and {MAX_SEARCH_RESULTS}"),
            });
        }

        if self.search.min_query_len == 0 {
            return Err(ConfigError::Invalid {
                var: "SEARCH_MIN_QUERY_LEN".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.magic_link.ttl_secs == 0 || self.magic_link.ttl_secs > MAX_MAGIC_LINK_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "MAGIC_LINK_TTL_SECS".to_string(),
                reason: format!("Must be between 1 and {MAX_MAGIC_LINK_TTL_SECS}"),
            });
        }

        if self.magic_link.max_per_hour == 0 {
            return Err(ConfigError::Invalid {
                var: "MAGIC_LINK_MAX_PER_HOUR".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if !self.magic_link.redirect_url.starts_with("http://")
            && !self.magic_link.redirect_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                var: "MAGIC_LINK_REDIRECT_URL".to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }

        if self.store_timeout_secs == 0 || self.store_timeout_secs > MAX_STORE_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                var: "STORE_TIMEOUT_SECS".to_string(),
                reason: format!("Must be between 1 and {MAX_STORE_TIMEOUT_SECS}"),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn magic_link_ttl(&self) -> Duration {
        Duration::from_secs(self.magic_link.ttl_secs)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Unset is `None`; set but unparseable is an error
fn parse_addr_env(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not a socket address"),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::new("a".repeat(32))
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.limit, 10);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert_eq!(config.magic_link_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = ServerConfig::new("short".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_search_limit_capped() {
        let mut config = config();
        config.search.limit = 11;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SEARCH_LIMIT"));

        config.search.limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redirect_must_be_http() {
        let mut config = config();
        config.magic_link.redirect_url = "javascript:alert(1)".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref var, .. }) if var == "MAGIC_LINK_REDIRECT_URL"
        ));
    }

    #[test]
    fn test_store_timeout_bounded() {
        let mut config = config();
        config.store_timeout_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref var, .. }) if var == "STORE_TIMEOUT_SECS"
        ));

        config.store_timeout_secs = MAX_STORE_TIMEOUT_SECS;
        assert!(config.validate().is_ok());

        config.store_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_magic_link_ttl_bounded() {
        let mut config = config();
        config.magic_link.ttl_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref var, .. }) if var == "MAGIC_LINK_TTL_SECS"
        ));

        config.magic_link.ttl_secs = MAX_MAGIC_LINK_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metrics_cannot_share_bind() {
        let mut config = config();
        config.metrics_bind = Some(config.bind);
        assert!(config.validate().is_err());
    }
}
