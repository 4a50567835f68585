//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the card sorter server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Run state (collected dynamically from the supervisor)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cardsort_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardsort_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cardsort_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cardsort_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cardsort_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardsort_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cardsort_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Run Metrics (collected dynamically)
// =============================================================================

/// Run state (1 = running, 0 = idle).
pub static RUN_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cardsort_run_active",
        "Whether a run is executing (1) or not (0)",
    )
    .unwrap()
});

/// Slot the magazine is positioned at.
pub static MAGAZINE_POSITION: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cardsort_magazine_position",
        "Current magazine slot (0 = home)",
    )
    .unwrap()
});

/// Records in the history.
pub static CARDS_RECORDED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("cardsort_cards_recorded", "Records held in the history").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Run
    registry.register(Box::new(RUN_ACTIVE.clone())).unwrap();
    registry
        .register(Box::new(MAGAZINE_POSITION.clone()))
        .unwrap();
    registry.register(Box::new(CARDS_RECORDED.clone())).unwrap();

    // Core metrics (engine, supervisor)
    for metric in cardsort_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding. Uses the non-consuming status so a scrape never
/// swallows a notification meant for a poller.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.supervisor().peek_status();
    RUN_ACTIVE.set(if status.running { 1 } else { 0 });
    MAGAZINE_POSITION.set(i64::from(status.current_position));
    CARDS_RECORDED.set(status.total_recorded as i64);
}

static UUID_SEGMENT: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});

static NUMERIC_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/images/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/images/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/assets/12345";
        assert_eq!(normalize_path(path), "/assets/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/process/status";
        assert_eq!(normalize_path(path), "/api/v1/process/status");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("cardsort_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Labelled metrics only show up once a label set was touched
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        WS_CONNECTIONS_ACTIVE.set(0);
        WS_CONNECTIONS_TOTAL.inc();
        RUN_ACTIVE.set(0);
        MAGAZINE_POSITION.set(0);
        cardsort_core::metrics::RUNS_FINISHED
            .with_label_values(&["completed"])
            .inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("cardsort_http_request_duration_seconds"));
        assert!(output.contains("cardsort_http_requests_in_flight"));
        assert!(output.contains("cardsort_ws_connections_active"));
        assert!(output.contains("cardsort_ws_connections_total"));
        assert!(output.contains("cardsort_run_active"));
        assert!(output.contains("cardsort_magazine_position"));
        assert!(output.contains("cardsort_runs_finished_total"));
    }
}
