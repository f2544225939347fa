//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define runner metrics (requests, latency, registered routes)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `runner_requests_total` (counter): dispatched requests by route, outcome
//! - `runner_request_duration_seconds` (histogram): dispatch latency by route
//! - `runner_routes_registered` (gauge): table size by origin
//!
//! # Design Decisions
//! - Labels use the registered route path, never the raw request path
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_dispatch(route: &str, outcome: &'static str, start: Instant) {
    counter!(
        "runner_requests_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("runner_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the number of registered routes for an origin.
pub fn record_routes(origin: &'static str, count: usize) {
    gauge!("runner_routes_registered", "origin" => origin).set(count as f64);
}
