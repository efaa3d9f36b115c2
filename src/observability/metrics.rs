//! # Metrics
//!
//! Prometheus metrics for the provider.
//!
//! ## Metrics Exposed
//!
//! - `podman_secret_operations_total` - Remote secret operations by operation
//! - `podman_secret_operation_errors_total` - Failed remote secret operations by operation
//! - `podman_secret_operation_duration_seconds` - Duration of remote secret operations
//! - `podman_secret_lifecycle_total` - Lifecycle operations driven by the host

use anyhow::Result;
use prometheus::{Encoder, HistogramVec, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SECRET_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "podman_secret_operations_total",
            "Total number of remote secret operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SECRET_OPERATIONS_TOTAL metric - this should never happen")
});

static SECRET_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "podman_secret_operation_errors_total",
            "Total number of failed remote secret operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SECRET_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static SECRET_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "podman_secret_operation_duration_seconds",
            "Duration of remote secret operations in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create SECRET_OPERATION_DURATION metric - this should never happen")
});

static LIFECYCLE_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "podman_secret_lifecycle_total",
            "Total number of resource lifecycle operations by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create LIFECYCLE_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry
///
/// Safe to call more than once; metrics that are already registered are skipped.
///
/// # Errors
///
/// Returns an error if a metric cannot be registered for any other reason.
pub fn register_metrics() -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(SECRET_OPERATIONS_TOTAL.clone()),
        Box::new(SECRET_OPERATION_ERRORS_TOTAL.clone()),
        Box::new(SECRET_OPERATION_DURATION.clone()),
        Box::new(LIFECYCLE_TOTAL.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

pub fn record_secret_operation(operation: &str, duration: f64) {
    SECRET_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
    SECRET_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_secret_operation_errors(operation: &str) {
    SECRET_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn record_lifecycle(operation: &str, outcome: &str) {
    LIFECYCLE_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Render the registry in the Prometheus text exposition format
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
