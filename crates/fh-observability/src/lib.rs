//! # fh-observability
//!
//! Logging and metrics infrastructure for Fleet Hunt.
//!
//! `fh-core` records its metrics through the `metrics` facade and logs through
//! `tracing`. This crate installs the subscriber and the Prometheus exporter
//! that turn those calls into output.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
pub use metrics::{install_prometheus_exporter, register_metrics, MetricsError};
