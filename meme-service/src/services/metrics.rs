//! Prometheus metrics for meme-service.
//!
//! Provides endpoint and gateway metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Endpoint metrics
pub static MEME_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Gateway metrics
pub static GATEWAY_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static GATEWAY_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Batch metrics
pub static BATCH_SIZE: OnceLock<HistogramVec> = OnceLock::new();
pub static BATCH_ITEM_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; later calls are no-ops.
pub fn init_metrics() {
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("meme_requests_total", "Total number of endpoint requests"),
        &["endpoint", "outcome"],
    )
    .expect("Failed to create meme_requests_total metric");

    let gateway_latency = HistogramVec::new(
        HistogramOpts::new(
            "gateway_latency_seconds",
            "AI gateway call latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["operation"],
    )
    .expect("Failed to create gateway_latency_seconds metric");

    let gateway_errors = IntCounterVec::new(
        Opts::new("gateway_errors_total", "Total AI gateway errors"),
        &["operation", "error_type"],
    )
    .expect("Failed to create gateway_errors_total metric");

    let batch_size = HistogramVec::new(
        HistogramOpts::new("image_batch_size", "Number of images per analysis request")
            .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0]),
        &["source"],
    )
    .expect("Failed to create image_batch_size metric");

    let item_failures = IntCounterVec::new(
        Opts::new(
            "image_batch_item_failures_total",
            "Batch items that produced an error entry",
        ),
        &["stage"],
    )
    .expect("Failed to create image_batch_item_failures_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register meme_requests_total");
    registry
        .register(Box::new(gateway_latency.clone()))
        .expect("Failed to register gateway_latency_seconds");
    registry
        .register(Box::new(gateway_errors.clone()))
        .expect("Failed to register gateway_errors_total");
    registry
        .register(Box::new(batch_size.clone()))
        .expect("Failed to register image_batch_size");
    registry
        .register(Box::new(item_failures.clone()))
        .expect("Failed to register image_batch_item_failures_total");

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = MEME_REQUESTS_TOTAL.set(requests_total);
    let _ = GATEWAY_LATENCY_SECONDS.set(gateway_latency);
    let _ = GATEWAY_ERRORS_TOTAL.set(gateway_errors);
    let _ = BATCH_SIZE.set(batch_size);
    let _ = BATCH_ITEM_FAILURES_TOTAL.set(item_failures);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a finished endpoint request.
pub fn record_request(endpoint: &str, outcome: &str) {
    if let Some(counter) = MEME_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[endpoint, outcome]).inc();
    }
}

/// Record gateway latency.
pub fn record_gateway_latency(operation: &str, duration_secs: f64) {
    if let Some(histogram) = GATEWAY_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Record a gateway error.
pub fn record_gateway_error(operation: &str, error_type: &str) {
    if let Some(counter) = GATEWAY_ERRORS_TOTAL.get() {
        counter.with_label_values(&[operation, error_type]).inc();
    }
}

/// Record the size of an accepted batch.
pub fn record_batch_size(source: &str, size: usize) {
    if let Some(histogram) = BATCH_SIZE.get() {
        histogram.with_label_values(&[source]).observe(size as f64);
    }
}

/// Record a batch item that ended with an error entry.
pub fn record_item_failure(stage: &str) {
    if let Some(counter) = BATCH_ITEM_FAILURES_TOTAL.get() {
        counter.with_label_values(&[stage]).inc();
    }
}
