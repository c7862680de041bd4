//! Filesystem-backed hunt store.
//!
//! Layout: the record at `/hunts/H.1234` lives in `<root>/hunts/H.1234.json`.
//! Writes go to a hidden temporary file that is renamed over the target, so a
//! reader never sees a half-written record.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::{HuntStore, StoreError};
use crate::hunt::Hunt;

const RECORD_EXTENSION: &str = ".json";

/// A hunt store writing one JSON document per record under a root directory.
#[derive(Debug, Clone)]
pub struct FileHuntStore {
    root: PathBuf,
}

impl FileHuntStore {
    /// Creates a store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a logical path onto a directory below the root.
    fn resolve_dir(&self, path: &str) -> Result<PathBuf, StoreError> {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            resolved.push(segment);
        }
        if resolved == self.root {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(resolved)
    }

    /// Maps a logical record path onto its JSON file.
    fn resolve_record(&self, path: &str) -> Result<PathBuf, StoreError> {
        let dir = self.resolve_dir(path)?;
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        Ok(dir.with_file_name(format!("{}{}", name, RECORD_EXTENSION)))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::io(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl HuntStore for FileHuntStore {
    async fn put(&self, path: &str, hunt: &Hunt) -> Result<(), StoreError> {
        let target = self.resolve_record(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;

        let bytes = serde_json::to_vec_pretty(hunt)?;
        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        let temp = parent.join(format!(".{}.tmp", file_name));

        fs::write(&temp, &bytes)
            .await
            .map_err(|e| io_error(&temp, e))?;
        fs::rename(&temp, &target)
            .await
            .map_err(|e| io_error(&target, e))?;

        debug!(path = %path, file = %target.display(), "Wrote hunt record");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Hunt, StoreError> {
        let target = self.resolve_record(path)?;
        let bytes = match fs::read(&target).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => return Err(io_error(&target, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Hunt>, StoreError> {
        let dir = self.resolve_dir(namespace)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut hunts = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') || !name.ends_with(RECORD_EXTENSION) {
                continue;
            }

            let file = entry.path();
            let bytes = match fs::read(&file).await {
                Ok(bytes) => bytes,
                // Renamed away between read_dir and read.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&file, e)),
            };
            match serde_json::from_slice::<Hunt>(&bytes) {
                Ok(hunt) => hunts.push(hunt),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Skipping undecodable hunt record");
                }
            }
        }

        Ok(hunts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunt::fixtures::paused_hunt;
    use crate::hunt::{HuntPaths, HUNTS_NAMESPACE};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileHuntStore::new(dir.path());
        let hunt = paused_hunt("H.0a0b0c0d");
        let path = HuntPaths::new(hunt.hunt_id()).record();

        store.put(&path, &hunt).await.unwrap();
        assert!(dir.path().join("hunts").join("H.0a0b0c0d.json").exists());
        assert_eq!(store.get(&path).await.unwrap(), hunt);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_record() {
        let dir = TempDir::new().unwrap();
        let store = FileHuntStore::new(dir.path());
        let mut hunt = paused_hunt("H.01");
        store.put("/hunts/H.01", &hunt).await.unwrap();

        hunt.stats_mut().clients_scheduled = 42;
        store.put("/hunts/H.01", &hunt).await.unwrap();

        let loaded = store.get("/hunts/H.01").await.unwrap();
        assert_eq!(loaded.stats.unwrap().clients_scheduled, 42);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("hunts"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_missing_record_and_namespace() {
        let dir = TempDir::new().unwrap();
        let store = FileHuntStore::new(dir.path());
        assert!(store.get("/hunts/H.none").await.unwrap_err().is_not_found());
        assert!(store.list(HUNTS_NAMESPACE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_foreign_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = FileHuntStore::new(dir.path());
        store.put("/hunts/H.01", &paused_hunt("H.01")).await.unwrap();
        store.put("/hunts/H.02", &paused_hunt("H.02")).await.unwrap();
        std::fs::write(dir.path().join("hunts/notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("hunts/H.03.json"), "{ broken").unwrap();

        let hunts = store.list(HUNTS_NAMESPACE).await.unwrap();
        assert_eq!(hunts.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FileHuntStore::new(dir.path());
        let err = store
            .put("/hunts/../../etc/passwd", &paused_hunt("H.01"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_path");
        assert_eq!(store.get("/").await.unwrap_err().kind(), "invalid_path");
    }
}
