//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routegate_requests_total` (counter): requests by method, route, status
//! - `routegate_request_duration_seconds` (histogram): pipeline latency by method, route
//! - `routegate_guard_rejections_total` (counter): guard rejections by route
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "routegate_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "routegate_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_guard_rejection(route: &str) {
    counter!("routegate_guard_rejections_total", "route" => route.to_string()).increment(1);
}
