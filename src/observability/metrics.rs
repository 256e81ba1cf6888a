//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_exchanges_total` (counter): exchanges by outcome (`ok`, `failed`)
//! - `relay_failures_total` (counter): failures by kind
//! - `relay_body_bytes_total` (counter): body bytes by direction
//! - `relay_exchange_duration_seconds` (histogram): exchange latency
//! - `relay_active_connections` (gauge): current connection count
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus endpoint is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::error::FailureKind;

/// Direction label for body byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upstream,
    Downstream,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Upstream => "upstream",
            Direction::Downstream => "downstream",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_exchange_ok(start_time: Instant) {
    ::metrics::counter!("relay_exchanges_total", "outcome" => "ok").increment(1);
    ::metrics::histogram!("relay_exchange_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_exchange_failed(kind: FailureKind, start_time: Instant) {
    ::metrics::counter!("relay_exchanges_total", "outcome" => "failed").increment(1);
    ::metrics::counter!("relay_failures_total", "kind" => kind.as_str()).increment(1);
    ::metrics::histogram!("relay_exchange_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_body_bytes(direction: Direction, bytes: u64) {
    ::metrics::counter!("relay_body_bytes_total", "direction" => direction.as_str())
        .increment(bytes);
}

pub fn record_active_connections(count: u64) {
    ::metrics::gauge!("relay_active_connections").set(count as f64);
}
