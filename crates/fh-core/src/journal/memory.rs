use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::info;

use super::{validate_artifact_name, Journal, JournalError, JournalMetadata};

/// Default number of rows kept in memory.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;

/// One appended row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub artifact: String,
    pub source: String,
    pub metadata: JournalMetadata,
    pub row: serde_json::Value,
}

/// Journal keeping the most recent rows in memory.
pub struct MemoryJournal {
    entries: RwLock<VecDeque<JournalEntry>>,
    max_entries: usize,
    log_to_tracing: bool,
}

impl MemoryJournal {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries: max_entries.max(1),
            log_to_tracing: true,
        }
    }

    /// Creates a journal that does not echo rows to tracing.
    pub fn without_tracing(max_entries: usize) -> Self {
        Self {
            log_to_tracing: false,
            ..Self::new(max_entries)
        }
    }

    /// Returns every retained row, oldest first.
    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Returns the retained rows of one artifact.
    pub async fn entries_for_artifact(&self, artifact: &str) -> Vec<JournalEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.artifact == artifact)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn append_row(
        &self,
        artifact: &str,
        source: &str,
        metadata: JournalMetadata,
        row: serde_json::Value,
    ) -> Result<(), JournalError> {
        validate_artifact_name(artifact)?;
        if self.log_to_tracing {
            info!(
                artifact = %artifact,
                source = %source,
                hunt_id = ?metadata.hunt_id,
                "Journal: {}",
                row
            );
        }

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(JournalEntry {
            artifact: artifact.to_string(),
            source: source.to_string(),
            metadata,
            row,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunt::HuntId;
    use serde_json::json;

    #[tokio::test]
    async fn test_append_and_filter() {
        let journal = MemoryJournal::without_tracing(10);
        let id: HuntId = "H.01".parse().unwrap();
        journal
            .append_row(
                "System.Hunt.Archive",
                "server",
                JournalMetadata::for_hunt(&id),
                json!({"Hunt": "H.01"}),
            )
            .await
            .unwrap();
        journal
            .append_row("System.Other", "server", JournalMetadata::for_hunt(&id), json!({}))
            .await
            .unwrap();

        let archived = journal.entries_for_artifact("System.Hunt.Archive").await;
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].row["Hunt"], "H.01");
        assert_eq!(archived[0].metadata.hunt_id, Some(id));
    }

    #[tokio::test]
    async fn test_bounded_history() {
        let journal = MemoryJournal::without_tracing(3);
        let id: HuntId = "H.01".parse().unwrap();
        for i in 0..5 {
            journal
                .append_row("A", "server", JournalMetadata::for_hunt(&id), json!({ "n": i }))
                .await
                .unwrap();
        }
        let entries = journal.entries().await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].row["n"], 2);
    }

    #[tokio::test]
    async fn test_rejects_bad_artifact() {
        let journal = MemoryJournal::default();
        let id: HuntId = "H.01".parse().unwrap();
        let err = journal
            .append_row("../x", "server", JournalMetadata::for_hunt(&id), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_artifact");
        assert!(journal.is_empty().await);
    }
}
