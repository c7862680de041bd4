use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{validate_artifact_name, Journal, JournalError, JournalMetadata};

#[derive(Serialize)]
struct JsonlRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    metadata: &'a JournalMetadata,
    row: &'a serde_json::Value,
}

/// Journal appending one JSON line per row to `<root>/<artifact>.jsonl`.
#[derive(Debug)]
pub struct JsonlJournal {
    root: PathBuf,
    // Serializes appends so concurrent rows never interleave.
    write_lock: Mutex<()>,
}

impl JsonlJournal {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the file rows of `artifact` are appended to.
    pub fn artifact_file(&self, artifact: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", artifact))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Journal for JsonlJournal {
    async fn append_row(
        &self,
        artifact: &str,
        source: &str,
        metadata: JournalMetadata,
        row: serde_json::Value,
    ) -> Result<(), JournalError> {
        validate_artifact_name(artifact)?;
        let mut line = serde_json::to_vec(&JsonlRecord {
            source,
            metadata: &metadata,
            row: &row,
        })?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| JournalError::Io(format!("{}: {}", self.root.display(), e)))?;
        let path = self.artifact_file(artifact);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| JournalError::Io(format!("{}: {}", path.display(), e)))?;
        file.write_all(&line)
            .await
            .map_err(|e| JournalError::Io(format!("{}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| JournalError::Io(format!("{}: {}", path.display(), e)))?;

        debug!(artifact = %artifact, file = %path.display(), "Appended journal row");
        Ok(())
    }
}
