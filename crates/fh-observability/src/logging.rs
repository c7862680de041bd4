//! Logging infrastructure for Fleet Hunt.
//!
//! Structured logging built on the tracing ecosystem. `RUST_LOG` overrides the
//! configured level when set.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Crates whose events pass the default filter.
const LOGGED_CRATES: &[&str] = &["fh_core", "fh_observability", "fh_cli"];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    pub level: Level,
    /// Whether to use JSON format.
    pub json_format: bool,
    /// Whether to include span events.
    pub include_spans: bool,
    /// Whether to include file/line info.
    pub include_location: bool,
    /// Whether to include thread IDs.
    pub include_thread_ids: bool,
    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_spans: false,
            include_location: false,
            include_thread_ids: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates a development configuration with more verbose output.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_spans: true,
            include_location: true,
            include_thread_ids: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_spans: false,
            include_location: false,
            include_thread_ids: false,
            include_target: true,
        }
    }

    /// Sets the level from a name such as `debug`, falling back to `INFO`.
    pub fn with_level_name(mut self, name: &str) -> Self {
        self.level = name.parse().unwrap_or(Level::INFO);
        self
    }

    /// Switches between JSON and text output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// The filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        LOGGED_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initializes the logging system with default configuration.
pub fn init_logging() -> Result<(), TryInitError> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initializes the logging system with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_target(config.include_target)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_target(config.include_target)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    }
}

/// Creates a span for work on a single hunt.
#[macro_export]
macro_rules! hunt_span {
    ($hunt_id:expr) => {
        tracing::info_span!("hunt", hunt_id = %$hunt_id)
    };
    ($hunt_id:expr, $($field:tt)*) => {
        tracing::info_span!("hunt", hunt_id = %$hunt_id, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert_eq!(config.level, Level::INFO);
        assert!(config.json_format);
    }

    #[test]
    fn test_development_config() {
        let config = LoggingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_spans);
    }

    #[test]
    fn test_level_name_parsing() {
        assert_eq!(LoggingConfig::default().with_level_name("warn").level, Level::WARN);
        assert_eq!(LoggingConfig::default().with_level_name("DEBUG").level, Level::DEBUG);
        assert_eq!(LoggingConfig::default().with_level_name("loud").level, Level::INFO);
    }

    #[test]
    fn test_filter_directive_covers_all_crates() {
        let directive = LoggingConfig::development().filter_directive();
        assert_eq!(directive, "fh_core=DEBUG,fh_observability=DEBUG,fh_cli=DEBUG");
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_hunt_span_macro() {
        let span = hunt_span!("H.1234", action = "start");
        drop(span);
    }
}
