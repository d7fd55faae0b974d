//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): requests by destination, status
//! - `bridge_request_duration_seconds` (histogram): latency by destination
//! - `bridge_rpc_errors_total` (counter): failed calls by destination, kind
//! - `bridge_active_links` (gauge): registered bridge servers

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::link::DestinationId;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(destination: &DestinationId, status: u16, start: Instant) {
    let destination = destination.to_string();
    ::metrics::counter!(
        "bridge_requests_total",
        "destination" => destination.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("bridge_request_duration_seconds", "destination" => destination)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rpc_error(destination: &DestinationId, kind: &'static str) {
    ::metrics::counter!(
        "bridge_rpc_errors_total",
        "destination" => destination.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn set_active_links(count: usize) {
    ::metrics::gauge!("bridge_active_links").set(count as f64);
}
