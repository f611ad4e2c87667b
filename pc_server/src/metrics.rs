//! Prometheus metrics.
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! handlers call these helpers unconditionally.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pc_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/tournaments", 201);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Errors
///
/// Returns a message if the listener or global recorder cannot be installed
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Round-1 matches written for a new bracket.
pub fn bracket_matches_committed(count: usize) {
    metrics::counter!("bracket_matches_committed_total").increment(count as u64);
    metrics::counter!("brackets_committed_total").increment(1);
}

/// Player search served.
pub fn player_searches_total(results: usize) {
    metrics::counter!("player_searches_total").increment(1);
    metrics::histogram!("player_search_results").record(results as f64);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Magic link emailed.
pub fn magic_links_issued_total() {
    metrics::counter!("magic_links_issued_total").increment(1);
}

/// Magic link exchanged for a session.
pub fn sign_ins_total(success: bool) {
    metrics::counter!("sign_ins_total",
        "success" => success.to_string()
    )
    .increment(1);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}
