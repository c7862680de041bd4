//! Configuration validation for Fleet Hunt.
//!
//! Checks run before any command touches the hunt store, so that a bad
//! artifact directory or wake-up pattern is reported up front instead of on
//! the first hunt that needs it.

use crate::config::AppConfig;
use colored::Colorize;
use fh_core::artifacts::load_definitions;
use std::net::SocketAddr;

/// Refresh intervals above this are accepted but reported.
const SLOW_REFRESH_SECS: u64 = 60 * 60;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Critical errors that prevent startup.
    pub errors: Vec<String>,
    /// Warnings that should be addressed but don't prevent startup.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to stderr.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            eprintln!();
            eprintln!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                eprintln!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            eprintln!();
            eprintln!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                eprintln!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            eprintln!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before a command runs.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_storage(config, &mut result);
        Self::validate_artifacts(config, &mut result);
        Self::validate_dispatcher(config, &mut result);
        Self::validate_notifier(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_metrics(config, &mut result);

        result
    }

    fn validate_storage(config: &AppConfig, result: &mut ValidationResult) {
        let data_dir = &config.storage.data_dir;
        if data_dir.as_os_str().is_empty() {
            result.add_error("storage.data_dir must not be empty");
        } else if data_dir.is_file() {
            result.add_error(format!(
                "storage.data_dir '{}' is a file, expected a directory",
                data_dir.display()
            ));
        } else if !data_dir.exists() {
            result.add_warning(format!(
                "storage.data_dir '{}' does not exist yet. It will be created on first write.",
                data_dir.display()
            ));
        }
    }

    fn validate_artifacts(config: &AppConfig, result: &mut ValidationResult) {
        let dir = &config.artifacts.definitions_dir;
        if !dir.is_dir() {
            result.add_error(format!(
                "Artifact definitions directory not found: {}",
                dir.display()
            ));
            return;
        }

        match load_definitions(dir) {
            Ok(definitions) if definitions.is_empty() => {
                result.add_warning(format!(
                    "No artifact definitions in {}. Hunts cannot be created until some are added.",
                    dir.display()
                ));
            }
            Ok(_) => {}
            Err(e) => {
                result.add_error(format!("Invalid artifact definitions: {}", e));
            }
        }
    }

    fn validate_dispatcher(config: &AppConfig, result: &mut ValidationResult) {
        let dispatcher = &config.dispatcher;

        if dispatcher.refresh_interval_secs == 0 {
            result.add_error("dispatcher.refresh_interval_secs must be greater than zero");
        } else if dispatcher.refresh_interval_secs > SLOW_REFRESH_SECS {
            result.add_warning(format!(
                "dispatcher.refresh_interval_secs is {}. Hunts written by other servers \
                 will take over an hour to appear.",
                dispatcher.refresh_interval_secs
            ));
        }

        if dispatcher.default_expiry_hours == 0 {
            result.add_error("dispatcher.default_expiry_hours must be greater than zero");
        }

        if dispatcher.max_list_count == 0 {
            result.add_error("dispatcher.max_list_count must be greater than zero");
        }

        if dispatcher.archive_artifact.trim().is_empty() {
            result.add_error("dispatcher.archive_artifact must not be empty");
        }
    }

    fn validate_notifier(config: &AppConfig, result: &mut ValidationResult) {
        if let Err(e) = regex::Regex::new(&config.notifier.wakeup_pattern) {
            result.add_error(format!(
                "notifier.wakeup_pattern '{}' is not a valid regex: {}",
                config.notifier.wakeup_pattern, e
            ));
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        if config.logging.level.parse::<tracing::Level>().is_err() {
            result.add_warning(format!(
                "Unknown logging.level '{}'. Falling back to 'info'.",
                config.logging.level
            ));
        }
    }

    fn validate_metrics(config: &AppConfig, result: &mut ValidationResult) {
        if !config.metrics.enabled {
            return;
        }
        if config.metrics.listen.parse::<SocketAddr>().is_err() {
            result.add_error(format!(
                "metrics.listen '{}' is not a valid socket address",
                config.metrics.listen
            ));
        }
    }
}
