//! Prometheus metrics for the event server.
//!
//! Metrics are exposed in Prometheus text format on the address given by
//! `METRICS_BIND`. Without it the recorders are no-ops.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration by method, path and status
//! - **Bracket Metrics**: Brackets generated, match results by outcome
//! - **Event Metrics**: Registrations, running event actors
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use arena_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("GET", "/api/v1/events", 200);
//! metrics::brackets_generated_total("double");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
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
///
/// Increments the total HTTP request counter with method, path, and status labels.
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
// Bracket Metrics
// ============================================================================

/// Increment brackets generated counter.
pub fn brackets_generated_total(elimination: &str) {
    metrics::counter!("brackets_generated_total",
        "elimination" => elimination.to_string()
    )
    .increment(1);
}

/// Increment match results counter.
///
/// `outcome` is `advanced`, `final` or a rejection reason.
pub fn match_results_total(outcome: &'static str) {
    metrics::counter!("match_results_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// Event Metrics
// ============================================================================

/// Increment registrations counter.
pub fn registrations_total(kind: &'static str) {
    metrics::counter!("registrations_total", "kind" => kind).increment(1);
}

/// Set current running event actors count.
pub fn active_events(count: usize) {
    metrics::gauge!("active_events").set(count as f64);
}
