//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sequence engine (slots, homing, capture, recognition)
//! - Run supervisor (finished runs)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sequence Engine
// =============================================================================

/// Slots processed total by result.
pub static SLOTS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardsort_slots_processed_total", "Total slots processed"),
        &["result"], // "recognized", "placeholder"
    )
    .unwrap()
});

/// Homing attempts total by result.
pub static HOMING_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardsort_homing_attempts_total", "Total homing attempts"),
        &["result"], // "success", "timeout", "fault"
    )
    .unwrap()
});

/// Capture failures total.
pub static CAPTURE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cardsort_capture_failures_total",
        "Total image captures that failed",
    )
    .unwrap()
});

/// Recognition duration in seconds.
pub static RECOGNITION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cardsort_recognition_duration_seconds",
            "Duration of recognition calls",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .unwrap()
});

// =============================================================================
// Run Supervisor
// =============================================================================

/// Runs finished total by outcome.
pub static RUNS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cardsort_runs_finished_total", "Total runs finished"),
        &["outcome"], // "completed", "stopped", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sequence engine
        Box::new(SLOTS_PROCESSED.clone()),
        Box::new(HOMING_ATTEMPTS.clone()),
        Box::new(CAPTURE_FAILURES.clone()),
        Box::new(RECOGNITION_DURATION.clone()),
        // Run supervisor
        Box::new(RUNS_FINISHED.clone()),
    ]
}
