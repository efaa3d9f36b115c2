//! # Observability
//!
//! Observability modules for logging and metrics.
//!
//! - `logging`: tracing subscriber setup
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;
