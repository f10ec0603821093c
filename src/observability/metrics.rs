//! Metrics collection and exposition.
//!
//! # Metrics
//! - `multicaddy_passes_total` (counter): regeneration passes run
//! - `multicaddy_tenants` (gauge): tenants found by the last pass
//! - `multicaddy_aggregate_bytes` (gauge): size of the last aggregate
//! - `multicaddy_watched_paths` (gauge): paths registered with the watcher
//! - `multicaddy_reloads_total` (counter): activations by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Exporter is optional and off by default

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::reload::ReloadOutcome;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_pass(tenants: usize, aggregate_bytes: usize) {
    ::metrics::counter!("multicaddy_passes_total").increment(1);
    ::metrics::gauge!("multicaddy_tenants").set(tenants as f64);
    ::metrics::gauge!("multicaddy_aggregate_bytes").set(aggregate_bytes as f64);
}

pub fn record_watched_paths(count: usize) {
    ::metrics::gauge!("multicaddy_watched_paths").set(count as f64);
}

pub fn record_reload(outcome: ReloadOutcome) {
    ::metrics::counter!("multicaddy_reloads_total", "outcome" => outcome.as_str()).increment(1);
}
