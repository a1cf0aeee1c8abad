//! Prometheus metrics for monitoring session health and gameplay.
//!
//! Metrics are rendered in Prometheus text format by the `/metrics` endpoint.
//! When no recorder is installed every call here is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration
//! - **WebSocket Metrics**: Active connections, messages received
//! - **Game Metrics**: Sessions, rounds started, commands, power cards

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle used to render it.
pub fn init_metrics() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))
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
// WebSocket Metrics
// ============================================================================

/// A presentation client connected.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A presentation client went away.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current open sessions count.
pub fn sessions_active(count: usize) {
    metrics::gauge!("sessions_active").set(count as f64);
}

/// Increment sessions created counter.
pub fn sessions_created_total() {
    metrics::counter!("sessions_created_total").increment(1);
}

/// Increment rounds started counter.
pub fn rounds_started_total() {
    metrics::counter!("rounds_started_total").increment(1);
}

/// Record one applied or rejected command.
///
/// `outcome` is `ok` or the error kind.
pub fn commands_total(command: &'static str, outcome: &str) {
    metrics::counter!("commands_total",
        "command" => command,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment power cards played counter.
pub fn power_cards_played_total() {
    metrics::counter!("power_cards_played_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        websocket_connected();
        websocket_messages_received();
        websocket_disconnected();
        sessions_active(3);
        sessions_created_total();
        rounds_started_total();
        commands_total("place_bet", "ok");
        power_cards_played_total();
    }
}
