//! Metrics module for metering-service.
//! Provides Prometheus metrics for billing reads and workflow transitions.
//!
//! Engine metrics live in the `prometheus` default registry. HTTP request
//! metrics from the shared middleware go through the `metrics` facade and are
//! rendered by the installed Prometheus recorder; `/metrics` serves both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Storage operation duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "metering_db_query_duration_seconds",
            "Storage operation duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Tariff change request transitions
pub static TARIFF_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Detailization request submissions
pub static DETAILIZATION_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Usage summaries served, by window
pub static USAGE_SUMMARIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Recorder behind the `metrics` facade. `None` if another recorder was
/// installed first.
static HTTP_METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    TARIFF_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "metering_tariff_requests_total",
                "Tariff change request actions by outcome"
            ),
            &["action", "outcome"]
        )
        .expect("Failed to register TARIFF_REQUESTS_TOTAL")
    });

    DETAILIZATION_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "metering_detailization_requests_total",
                "Detailization request submissions by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register DETAILIZATION_REQUESTS_TOTAL")
    });

    USAGE_SUMMARIES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "metering_usage_summaries_total",
                "Usage summaries computed by window"
            ),
            &["window"]
        )
        .expect("Failed to register USAGE_SUMMARIES_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("metering_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    HTTP_METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "HTTP metrics recorder not installed");
            None
        }
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    let mut output = String::from_utf8(buffer).unwrap_or_default();
    if let Some(Some(handle)) = HTTP_METRICS_HANDLE.get() {
        output.push_str(&handle.render());
    }
    output
}

/// Record a tariff request action (`create`, `approve`, `reject`).
pub fn record_tariff_request(action: &str, outcome: &str) {
    if let Some(counter) = TARIFF_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[action, outcome]).inc();
    }
}

/// Record a detailization submission.
pub fn record_detailization_request(outcome: &str) {
    if let Some(counter) = DETAILIZATION_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record a computed usage summary.
pub fn record_usage_summary(window: &str) {
    if let Some(counter) = USAGE_SUMMARIES_TOTAL.get() {
        // Arbitrary lastN values would explode cardinality.
        let label = match window {
            "1h" | "24h" => window,
            _ => "lastN",
        };
        counter.with_label_values(&[label]).inc();
    }
}

/// Record an error.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
