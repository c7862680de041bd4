use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{AvailableDownloads, DownloadError, DownloadFile, DownloadIndex};

/// In-memory download index for tests and single-process setups.
#[derive(Debug, Default)]
pub struct MemoryDownloadIndex {
    files: RwLock<HashMap<String, Vec<DownloadFile>>>,
    fail: AtomicBool,
}

impl MemoryDownloadIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed file of `size` bytes under `dir`.
    pub async fn publish(&self, dir: &str, name: &str, size: u64) {
        let file = DownloadFile {
            name: name.to_string(),
            path: format!("{}/{}", dir.trim_end_matches('/'), name),
            size,
            modified: Some(crate::hunt::now_micros()),
            complete: true,
        };
        self.files
            .write()
            .await
            .entry(dir.to_string())
            .or_default()
            .push(file);
    }

    /// Makes every lookup fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DownloadIndex for MemoryDownloadIndex {
    async fn list_available(&self, path: &str) -> Result<AvailableDownloads, DownloadError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DownloadError::Io("index unavailable".to_string()));
        }
        let files = self.files.read().await.get(path).cloned().unwrap_or_default();
        Ok(AvailableDownloads { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_list() {
        let index = MemoryDownloadIndex::new();
        index.publish("/downloads/hunts/H.01", "H.01.zip", 2048).await;

        let listed = index.list_available("/downloads/hunts/H.01").await.unwrap();
        assert_eq!(listed.files.len(), 1);
        assert_eq!(listed.files[0].path, "/downloads/hunts/H.01/H.01.zip");
        assert_eq!(listed.total_size(), 2048);

        assert!(index
            .list_available("/downloads/hunts/H.02")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let index = MemoryDownloadIndex::new();
        index.set_fail(true);
        let err = index.list_available("/downloads/hunts/H.01").await.unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
