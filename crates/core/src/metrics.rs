//! Metrics definitions for pagination.
//!
//! This module defines all metrics recorded by the resolver.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. Without an installed
//! recorder every call here is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "pagination_resolutions_total",
        "Total number of successful connection resolutions"
    );
    describe_counter!(
        "pagination_errors_total",
        "Total number of failed connection resolutions"
    );
    describe_histogram!(
        "pagination_resolution_duration_seconds",
        "Time taken to resolve a connection in seconds"
    );
    describe_histogram!(
        "pagination_page_size",
        "Number of edges returned per resolution"
    );
}

/// Record a successful resolution.
///
/// # Arguments
/// * `direction` - The paging direction ("forward", "backward" or "unbounded")
/// * `edges` - Number of edges returned
pub fn record_resolution(direction: &'static str, edges: usize) {
    counter!("pagination_resolutions_total", "direction" => direction).increment(1);
    histogram!("pagination_page_size").record(edges as f64);
}

/// Record a failed resolution.
pub fn record_resolution_error(kind: &'static str) {
    counter!("pagination_errors_total", "kind" => kind).increment(1);
}

/// Record resolution duration.
pub fn record_resolution_duration(duration_secs: f64) {
    histogram!("pagination_resolution_duration_seconds").record(duration_secs);
}

/// A timer that automatically records duration when dropped.
pub struct ResolutionTimer {
    start: Instant,
}

impl ResolutionTimer {
    /// Start a new resolution timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ResolutionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResolutionTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_resolution_duration(duration);
    }
}
