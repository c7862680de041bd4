//! Core hunt models.
//!
//! Defines the [`Hunt`] record and the types embedded in it: the lifecycle
//! [`HuntState`], the original [`StartRequest`] and the mutable [`HuntStats`]
//! counters.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::HuntId;
use crate::compiler::CompiledCollectorArgs;
use crate::downloads::AvailableDownloads;

/// Returns the current time truncated to microsecond resolution.
///
/// Every hunt timestamp goes through this so that a record survives a round
/// trip through the store without changing.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Lifecycle state of a hunt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HuntState {
    /// Not yet assigned. Resolved to `Paused` or `Running` at creation.
    #[default]
    Unset,
    /// Created but not scheduled on clients.
    Paused,
    /// Scheduled on every client that checks in.
    Running,
    /// No longer scheduled on new clients.
    Stopped,
    /// Terminal tombstone kept for history.
    Archived,
}

impl HuntState {
    /// Returns true if no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HuntState::Archived)
    }
}

impl std::fmt::Display for HuntState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HuntState::Unset => write!(f, "UNSET"),
            HuntState::Paused => write!(f, "PAUSED"),
            HuntState::Running => write!(f, "RUNNING"),
            HuntState::Stopped => write!(f, "STOPPED"),
            HuntState::Archived => write!(f, "ARCHIVED"),
        }
    }
}

impl std::str::FromStr for HuntState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UNSET" => Ok(HuntState::Unset),
            "PAUSED" => Ok(HuntState::Paused),
            "RUNNING" => Ok(HuntState::Running),
            "STOPPED" => Ok(HuntState::Stopped),
            "ARCHIVED" => Ok(HuntState::Archived),
            _ => Err(format!("Invalid hunt state: {}", s)),
        }
    }
}

/// Parameters supplied for one artifact of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Artifact the parameters apply to.
    pub artifact: String,
    /// Parameter name to value.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// The original, uncompiled artifact collection request of a hunt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Names of the artifacts to collect.
    pub artifacts: Vec<String>,
    /// Per-artifact parameter overrides.
    #[serde(default)]
    pub specs: Vec<ArtifactSpec>,
    /// Per-client query timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Maximum rows each client may upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
}

impl StartRequest {
    /// Creates a request collecting the given artifacts.
    pub fn new<I, S>(artifacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            artifacts: artifacts.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Adds an artifact to collect.
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifacts.push(artifact.into());
        self
    }

    /// Sets a parameter for one of the requested artifacts.
    pub fn with_parameter(
        mut self,
        artifact: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let artifact = artifact.into();
        let position = self.specs.iter().position(|s| s.artifact == artifact);
        let spec = match position {
            Some(index) => &mut self.specs[index],
            None => {
                self.specs.push(ArtifactSpec {
                    artifact,
                    parameters: BTreeMap::new(),
                });
                let last = self.specs.len() - 1;
                &mut self.specs[last]
            }
        };
        spec.parameters.insert(name.into(), value.into());
        self
    }

    /// Sets the per-client timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Sets the per-client row limit.
    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Returns the parameters given for an artifact, if any.
    pub fn parameters_for(&self, artifact: &str) -> Option<&BTreeMap<String, String>> {
        self.specs
            .iter()
            .find(|s| s.artifact == artifact)
            .map(|s| &s.parameters)
    }
}

/// Mutable counters of a hunt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HuntStats {
    /// Clients the hunt has been scheduled on.
    #[serde(default)]
    pub clients_scheduled: u64,
    /// Clients that finished the collection.
    #[serde(default)]
    pub clients_completed: u64,
    /// Clients whose collection failed.
    #[serde(default)]
    pub clients_errored: u64,
    /// Set once the hunt has run to completion or passed its expiry.
    #[serde(default)]
    pub stopped: bool,
    /// Downloads prepared for this hunt. Only attached on reads, never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_downloads: Option<AvailableDownloads>,
}

/// A fleet-wide, time-bounded artifact collection campaign.
///
/// Identity, timestamps, state and the compiled request are only readable
/// from outside the crate. State changes go through [`Hunt::apply`], which
/// owns the transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hunt {
    pub(crate) hunt_id: HuntId,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) creator: String,
    pub(crate) state: HuntState,
    pub(crate) create_time: DateTime<Utc>,
    #[serde(default)]
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) expires: DateTime<Utc>,
    pub(crate) start_request: StartRequest,
    #[serde(default)]
    pub(crate) compiled_request: Vec<CompiledCollectorArgs>,
    #[serde(default)]
    pub(crate) artifacts: Vec<String>,
    #[serde(default)]
    pub(crate) artifact_sources: Vec<String>,
    /// Counters. `None` only on damaged legacy records.
    #[serde(default)]
    pub stats: Option<HuntStats>,
}

impl Hunt {
    /// Returns the hunt identifier.
    pub fn hunt_id(&self) -> &HuntId {
        &self.hunt_id
    }

    /// Returns the operator-facing description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the principal that created the hunt.
    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> HuntState {
        self.state
    }

    /// Returns when the hunt was created.
    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Returns when the hunt was last started, if ever.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Returns when the hunt stops being scheduled.
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Returns the request as submitted.
    pub fn start_request(&self) -> &StartRequest {
        &self.start_request
    }

    /// Returns the compiled request fixed at creation.
    pub fn compiled_request(&self) -> &[CompiledCollectorArgs] {
        &self.compiled_request
    }

    /// Returns the collected artifact names.
    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }

    /// Returns the collected sources as `artifact/source` paths.
    pub fn artifact_sources(&self) -> &[String] {
        &self.artifact_sources
    }

    /// Returns the counters, inserting zeroed ones if absent.
    pub fn stats_mut(&mut self) -> &mut HuntStats {
        self.stats.get_or_insert_with(HuntStats::default)
    }

    /// Returns true if the hunt has passed its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }

    /// Fills the derived artifact lists of records written before they existed.
    pub(crate) fn backfill_artifacts(&mut self, artifact_sources: Vec<String>) {
        if !self.artifacts.is_empty() {
            return;
        }
        self.artifacts = self.start_request.artifacts.clone();
        self.artifact_sources = artifact_sources;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    /// Builds a paused hunt without going through the service.
    pub(crate) fn paused_hunt(id: &str) -> Hunt {
        let now = now_micros();
        Hunt {
            hunt_id: id.parse().unwrap(),
            description: "fixture".to_string(),
            creator: "tester".to_string(),
            state: HuntState::Paused,
            create_time: now,
            start_time: None,
            expires: now + Duration::days(7),
            start_request: StartRequest::new(["Generic.Client.Info"]),
            compiled_request: Vec::new(),
            artifacts: vec!["Generic.Client.Info".to_string()],
            artifact_sources: vec!["Generic.Client.Info/BasicInformation".to_string()],
            stats: Some(HuntStats::default()),
        }
    }
}
