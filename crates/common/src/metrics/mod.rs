//! Metrics and observability utilities
//!
//! Prometheus-style metrics through the `metrics` facade. The exporter is
//! installed by the binary; without one these calls are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all VERIFY metrics
pub const METRICS_PREFIX: &str = "verify";

/// Buckets for external model latency (in seconds); multimodal calls are slow
pub const MODEL_CALL_BUCKETS: &[f64] = &[
    0.250,
    0.500,
    1.000,
    2.000,
    5.000,
    10.00,
    20.00,
    30.00,
    60.00,
    120.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_analyses_total", METRICS_PREFIX),
        Unit::Count,
        "Completed analyses by content type and mode (live or demo)"
    );

    describe_counter!(
        format!("{}_analysis_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Analyses that ended in an error response"
    );

    describe_counter!(
        format!("{}_model_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total external model requests"
    );

    describe_histogram!(
        format!("{}_model_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External model round-trip latency in seconds"
    );

    describe_counter!(
        format!("{}_history_reads_total", METRICS_PREFIX),
        Unit::Count,
        "History lookups"
    );

    tracing::info!("Metrics registered");
}

/// Record a finished analysis
pub fn record_analysis(content_type: &str, degraded: bool) {
    let mode = if degraded { "demo" } else { "live" };

    counter!(
        format!("{}_analyses_total", METRICS_PREFIX),
        "content_type" => content_type.to_string(),
        "mode" => mode
    )
    .increment(1);
}

/// Record an analysis that failed
pub fn record_analysis_failure(content_type: &str, code: &str) {
    counter!(
        format!("{}_analysis_failures_total", METRICS_PREFIX),
        "content_type" => content_type.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}

/// Record one external model round trip
pub fn record_model_call(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_model_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_model_call_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(duration_secs);
}

/// Record a history lookup
pub fn record_history_read(rows: usize) {
    counter!(format!("{}_history_reads_total", METRICS_PREFIX)).increment(1);
    tracing::trace!(rows, "History read recorded");
}
