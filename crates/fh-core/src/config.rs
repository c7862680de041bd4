//! Runtime settings of the hunt service and dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between background mirror refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Default hunt lifetime when a request does not set `expires`.
pub const DEFAULT_HUNT_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Clients whose id matches this are woken when hunts change.
pub const DEFAULT_WAKEUP_PATTERN: &str = r"^[Cc]\.";

/// Journal artifact receiving one row per archived hunt.
pub const HUNT_ARCHIVE_ARTIFACT: &str = "System.Hunt.Archive";

/// Settings of [`HuntService`](crate::service::HuntService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntServiceConfig {
    /// Interval of the background refresh task.
    #[serde(default = "default_refresh_interval", with = "duration_secs")]
    pub refresh_interval: Duration,

    /// Expiry applied to hunts created without one.
    #[serde(default = "default_expiry", with = "duration_secs")]
    pub default_expiry: Duration,

    /// Regex selecting the clients woken after a change.
    #[serde(default = "default_wakeup_pattern")]
    pub wakeup_pattern: String,

    /// Journal artifact for archive rows.
    #[serde(default = "default_archive_artifact")]
    pub archive_artifact: String,

    /// Source name journal rows are attributed to.
    #[serde(default = "default_journal_source")]
    pub journal_source: String,

    /// Upper bound on the page size of `list_hunts`.
    #[serde(default = "default_max_list_count")]
    pub max_list_count: usize,
}

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

fn default_expiry() -> Duration {
    DEFAULT_HUNT_EXPIRY
}

fn default_wakeup_pattern() -> String {
    DEFAULT_WAKEUP_PATTERN.to_string()
}

fn default_archive_artifact() -> String {
    HUNT_ARCHIVE_ARTIFACT.to_string()
}

fn default_journal_source() -> String {
    "server".to_string()
}

fn default_max_list_count() -> usize {
    1000
}

impl Default for HuntServiceConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            default_expiry: default_expiry(),
            wakeup_pattern: default_wakeup_pattern(),
            archive_artifact: default_archive_artifact(),
            journal_source: default_journal_source(),
            max_list_count: default_max_list_count(),
        }
    }
}

impl HuntServiceConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    pub fn with_wakeup_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.wakeup_pattern = pattern.into();
        self
    }

    pub fn with_max_list_count(mut self, count: usize) -> Self {
        self.max_list_count = count;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HuntServiceConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert_eq!(config.default_expiry, Duration::from_secs(604_800));
        assert_eq!(config.wakeup_pattern, r"^[Cc]\.");
        assert_eq!(config.archive_artifact, "System.Hunt.Archive");
        assert_eq!(config.journal_source, "server");
        assert_eq!(config.max_list_count, 1000);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: HuntServiceConfig =
            serde_yaml::from_str("refresh_interval: 30\nmax_list_count: 50\n").unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.max_list_count, 50);
        assert_eq!(config.default_expiry, DEFAULT_HUNT_EXPIRY);
    }
}
