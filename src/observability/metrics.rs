//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_shutdowns_total` (counter): completed shutdowns by `mode`
//!   (`graceful` or `forced`)
//! - `server_connections_accepted_total` (counter): accepted connections
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus endpoint is opt-in

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const SHUTDOWNS_TOTAL: &str = "server_shutdowns_total";
pub const CONNECTIONS_ACCEPTED_TOTAL: &str = "server_connections_accepted_total";

/// How the server came to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    Graceful,
    Forced,
}

impl ShutdownMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownMode::Graceful => "graceful",
            ShutdownMode::Forced => "forced",
        }
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_shutdown(mode: ShutdownMode) {
    metrics::counter!(SHUTDOWNS_TOTAL, "mode" => mode.as_str()).increment(1);
}

pub fn record_connection_accepted() {
    metrics::counter!(CONNECTIONS_ACCEPTED_TOTAL).increment(1);
}
