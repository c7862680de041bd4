//! Server-side event journal.
//!
//! Rows are appended to a named artifact/source pair, the same addressing
//! that client results use, so audit events such as hunt archival can be
//! queried like any other collected data.

mod jsonl;
mod memory;

pub use jsonl::JsonlJournal;
pub use memory::{JournalEntry, MemoryJournal, DEFAULT_JOURNAL_CAPACITY};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hunt::{now_micros, HuntId};

/// Context recorded alongside a journal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunt_id: Option<HuntId>,
    pub recorded_at: DateTime<Utc>,
}

impl JournalMetadata {
    /// Metadata for a row about one hunt, stamped now.
    pub fn for_hunt(hunt_id: &HuntId) -> Self {
        Self {
            hunt_id: Some(hunt_id.clone()),
            recorded_at: now_micros(),
        }
    }
}

/// Errors that can occur when appending to the journal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("Invalid journal artifact name: {0}")]
    InvalidArtifact(String),

    #[error("Failed to encode journal row: {0}")]
    Serialization(String),

    #[error("Journal I/O error: {0}")]
    Io(String),
}

impl JournalError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArtifact(_) => "invalid_artifact",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Append-only sink for server-side event rows.
#[async_trait]
pub trait Journal: Send + Sync + 'static {
    /// Appends one row to `artifact`, attributed to `source`.
    async fn append_row(
        &self,
        artifact: &str,
        source: &str,
        metadata: JournalMetadata,
        row: serde_json::Value,
    ) -> Result<(), JournalError>;
}

/// Artifact names become file names, so only a conservative alphabet is
/// accepted.
pub(crate) fn validate_artifact_name(artifact: &str) -> Result<(), JournalError> {
    let valid = !artifact.is_empty()
        && !artifact.starts_with('.')
        && artifact
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(JournalError::InvalidArtifact(artifact.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name_validation() {
        assert!(validate_artifact_name("System.Hunt.Archive").is_ok());
        assert!(validate_artifact_name("").is_err());
        assert!(validate_artifact_name("../escape").is_err());
        assert!(validate_artifact_name(".hidden").is_err());
        assert!(validate_artifact_name("a/b").is_err());
    }
}
