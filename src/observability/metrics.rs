//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_samples_total` (counter): samples by locator and outcome
//! - `monitor_available` (gauge): 1=available, 0=unavailable, by locator
//! - `monitor_disruptions_total` (counter): detected disruptions by backend, connection
//!
//! # Design Decisions
//! - Labels for locator, backend, connection type
//! - Calls are no-ops until `init_metrics` installs the exporter

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::monitorapi::BackendConnectionType;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_sample(locator: &str, available: bool) {
    let outcome = if available { "available" } else { "unavailable" };
    counter!(
        "monitor_samples_total",
        "locator" => locator.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    gauge!("monitor_available", "locator" => locator.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

pub fn record_disruption_started(backend: &str, connection: BackendConnectionType) {
    counter!(
        "monitor_disruptions_total",
        "backend" => backend.to_string(),
        "connection" => connection.as_str()
    )
    .increment(1);
}
