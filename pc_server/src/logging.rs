//! Structured logging configuration.
//!
//! Records from the library's `log` macros are forwarded to the same
//! subscriber, so one `RUST_LOG` filter covers the whole process.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Requests slower than this are logged at warn level
pub const SLOW_REQUEST_MS: u64 = 1000;

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use pc_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `email` - Address involved, if any
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use pc_server::logging::log_security_event;
///
/// log_security_event(
///     "magic_link_throttled",
///     Some("sam@example.com"),
///     "Too many sign-in links requested",
/// );
/// ```
pub fn log_security_event(event_type: &str, email: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        email = email,
        "SECURITY: {}",
        message
    );
}

/// Log API request/response, escalating slow requests to warn
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Matched route
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if duration_ms > SLOW_REQUEST_MS {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "PERFORMANCE: Slow request"
        );
    } else {
        tracing::debug!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        log_security_event("test_event", Some("a@b.co"), "Test message");
        log_security_event("test_event", None, "Test message");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/v1/tournaments", 200, 45);
        log_api_request("POST", "/api/v1/tournaments", 504, 5001);
    }
}
