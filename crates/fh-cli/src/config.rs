//! Configuration loading for the Fleet Hunt CLI.

use anyhow::{Context, Result};
use fh_core::config::{DEFAULT_WAKEUP_PATTERN, HUNT_ARCHIVE_ARTIFACT};
use fh_core::HuntServiceConfig;
use fh_observability::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where hunts, journals and downloads live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Artifact definitions.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Dispatcher and hunt defaults.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Client wake-up settings.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Prometheus exporter used by `serve`.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads `path` if given, otherwise the default file if it exists.
    pub fn load_or_default(path: Option<&Path>, default_path: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if default_path.exists() => Self::load(default_path),
            None => Ok(Self::default()),
        }
    }

    /// Settings handed to the hunt service.
    pub fn service_config(&self) -> HuntServiceConfig {
        HuntServiceConfig {
            archive_artifact: self.dispatcher.archive_artifact.clone(),
            ..HuntServiceConfig::default()
        }
        .with_refresh_interval(Duration::from_secs(self.dispatcher.refresh_interval_secs))
        .with_default_expiry(Duration::from_secs(
            self.dispatcher.default_expiry_hours * 60 * 60,
        ))
        .with_wakeup_pattern(self.notifier.wakeup_pattern.clone())
        .with_max_list_count(self.dispatcher.max_list_count)
    }

    /// Logging settings, with `verbose` forcing debug output.
    pub fn logging_config(&self, verbose: bool, json: bool) -> LoggingConfig {
        let base = if verbose {
            LoggingConfig::development()
        } else {
            LoggingConfig::default().with_level_name(&self.logging.level)
        };
        base.with_json(json || self.logging.json)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the hunt records, journals and downloads.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "fleet-hunt", "fleet-hunt")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn journal_dir(&self) -> PathBuf {
        self.data_dir.join("journal")
    }
}

/// Artifact definition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory of `*.yaml` artifact definitions.
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: PathBuf,
}

fn default_definitions_dir() -> PathBuf {
    PathBuf::from("config/artifacts")
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            definitions_dir: default_definitions_dir(),
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Seconds between background refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Lifetime of hunts created without an expiry.
    #[serde(default = "default_expiry_hours")]
    pub default_expiry_hours: u64,

    /// Largest page `list` returns.
    #[serde(default = "default_max_list_count")]
    pub max_list_count: usize,

    /// Journal artifact for archived hunts.
    #[serde(default = "default_archive_artifact")]
    pub archive_artifact: String,
}

fn default_refresh_interval_secs() -> u64 {
    10
}

fn default_expiry_hours() -> u64 {
    7 * 24
}

fn default_max_list_count() -> usize {
    1000
}

fn default_archive_artifact() -> String {
    HUNT_ARCHIVE_ARTIFACT.to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            default_expiry_hours: default_expiry_hours(),
            max_list_count: default_max_list_count(),
            archive_artifact: default_archive_artifact(),
        }
    }
}

/// Notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Regex selecting the clients woken after a hunt changes.
    #[serde(default = "default_wakeup_pattern")]
    pub wakeup_pattern: String,
}

fn default_wakeup_pattern() -> String {
    DEFAULT_WAKEUP_PATTERN.to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            wakeup_pattern: default_wakeup_pattern(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit JSON lines.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Address the exporter listens on.
    #[serde(default = "default_metrics_listen")]
    pub listen: String,
}

fn default_metrics_listen() -> String {
    "127.0.0.1:9464".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}
