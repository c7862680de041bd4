//! Metric descriptions and Prometheus export for Fleet Hunt.
//!
//! `fh-core` emits its metrics through the `metrics` macros; without an
//! installed recorder those calls are no-ops.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use thiserror::Error;

/// Hunts created, labelled by initial `state`.
pub const HUNTS_CREATED: &str = "fh_hunts_created_total";
/// Hunt modifications, labelled by `outcome`.
pub const HUNT_MODIFICATIONS: &str = "fh_hunt_modifications_total";
/// Dispatcher refreshes, labelled by `result`.
pub const DISPATCHER_REFRESHES: &str = "fh_dispatcher_refresh_total";
pub const DISPATCHER_REFRESH_DURATION: &str = "fh_dispatcher_refresh_duration_seconds";
pub const DISPATCHER_MIRROR_SIZE: &str = "fh_dispatcher_mirror_size";
pub const NOTIFICATIONS: &str = "fh_notifications_total";

/// Errors raised while installing the exporter.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to install Prometheus exporter on {addr}: {source}")]
    Install {
        addr: SocketAddr,
        #[source]
        source: BuildError,
    },
}

impl MetricsError {
    /// Returns the error kind as a static string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Install { .. } => "install",
        }
    }
}

/// Registers the descriptions of every Fleet Hunt metric.
pub fn register_metrics() {
    describe_counter!(HUNTS_CREATED, "Total number of hunts created");
    describe_counter!(
        HUNT_MODIFICATIONS,
        "Total number of hunt modifications by outcome"
    );
    describe_counter!(
        DISPATCHER_REFRESHES,
        "Total number of dispatcher mirror refreshes"
    );
    describe_histogram!(
        DISPATCHER_REFRESH_DURATION,
        Unit::Seconds,
        "Time spent reloading the dispatcher mirror"
    );
    describe_gauge!(
        DISPATCHER_MIRROR_SIZE,
        "Number of hunts held in the dispatcher mirror"
    );
    describe_counter!(NOTIFICATIONS, "Total number of client wake-ups sent");
}

/// Installs a global Prometheus recorder serving `/metrics` on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|source| MetricsError::Install { addr, source })?;
    register_metrics();
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
