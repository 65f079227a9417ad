//! Metrics collection and exposition.
//!
//! # Metrics
//! - `responder_requests_total` (counter): completed requests by method, status
//! - `responder_request_duration_seconds` (histogram): pipeline latency
//! - `responder_timeouts_total` (counter): timers that fired before disarm
//! - `responder_faults_total` (counter): faults translated to 500
//! - `responder_active_timers` (gauge): entries currently in the timer registry
//! - `responder_shutdown_cancelled_timers` (counter): timers cancelled by shutdown
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus endpoint listens on its own address, never on the
//!   catch-all listener

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    counter!(
        "responder_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("responder_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_timeout() {
    counter!("responder_timeouts_total").increment(1);
}

pub fn record_fault(kind: &'static str) {
    counter!("responder_faults_total", "kind" => kind).increment(1);
}

pub fn record_active_timers(count: usize) {
    gauge!("responder_active_timers").set(count as f64);
}

pub fn record_shutdown_cancelled(count: usize) {
    counter!("responder_shutdown_cancelled_timers").increment(count as u64);
}
