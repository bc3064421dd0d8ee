//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_sanitized_keys_total` (counter): operator keys removed
//! - `gateway_sanitized_strings_total` (counter): strings rewritten
//! - `gateway_truncated_subtrees_total` (counter): over-deep subtrees dropped

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::sanitize::SanitizeReport;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record what a sanitizing stage changed.
pub fn record_sanitized(stage: &'static str, report: &SanitizeReport) {
    if report.keys_removed > 0 {
        counter!("gateway_sanitized_keys_total", "stage" => stage)
            .increment(report.keys_removed as u64);
    }
    if report.strings_rewritten > 0 {
        counter!("gateway_sanitized_strings_total", "stage" => stage)
            .increment(report.strings_rewritten as u64);
    }
    if report.subtrees_truncated > 0 {
        counter!("gateway_truncated_subtrees_total", "stage" => stage)
            .increment(report.subtrees_truncated as u64);
    }
}
