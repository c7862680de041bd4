//! In-memory hunt store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::warn;

use super::{HuntStore, StoreError};
use crate::hunt::Hunt;

/// A hunt store keeping serialized records in a map.
///
/// Records are stored as JSON bytes so every read decodes a fresh copy, the
/// same as a real backend would. Writes and lists can be made to fail for
/// testing error paths.
#[derive(Debug, Default)]
pub struct MemoryHuntStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_lists: AtomicBool,
    puts: AtomicU64,
}

impl MemoryHuntStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put` fail with [`StoreError::Unavailable`].
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `list` fail with [`StoreError::Unavailable`].
    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no record has been written.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Writes raw bytes at `path`, bypassing encoding.
    pub async fn put_raw(&self, path: &str, bytes: Vec<u8>) {
        self.records.write().await.insert(path.to_string(), bytes);
    }
}

fn is_direct_child(path: &str, namespace: &str) -> bool {
    path.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|name| !name.is_empty() && !name.contains('/'))
}

#[async_trait]
impl HuntStore for MemoryHuntStore {
    async fn put(&self, path: &str, hunt: &Hunt) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("writes disabled"));
        }
        let bytes = serde_json::to_vec(hunt)?;
        self.records.write().await.insert(path.to_string(), bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Hunt, StoreError> {
        let records = self.records.read().await;
        let bytes = records
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(serde_json::from_slice(bytes)?)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Hunt>, StoreError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("lists disabled"));
        }
        let records = self.records.read().await;
        let hunts = records
            .iter()
            .filter(|(path, _)| is_direct_child(path, namespace))
            .filter_map(|(path, bytes)| match serde_json::from_slice(bytes) {
                Ok(hunt) => Some(hunt),
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping undecodable hunt record");
                    None
                }
            })
            .collect();
        Ok(hunts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunt::fixtures::paused_hunt;
    use crate::hunt::{HuntPaths, HUNTS_NAMESPACE};

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryHuntStore::new();
        let hunt = paused_hunt("H.aa");
        let path = HuntPaths::new(hunt.hunt_id()).record();

        store.put(&path, &hunt).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), hunt);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryHuntStore::new();
        let err = store.get("/hunts/H.missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_only_direct_children() {
        let store = MemoryHuntStore::new();
        let a = paused_hunt("H.aa");
        let b = paused_hunt("H.bb");
        store.put("/hunts/H.aa", &a).await.unwrap();
        store.put("/hunts/H.bb", &b).await.unwrap();
        store.put("/hunts/H.aa/nested", &a).await.unwrap();
        store.put("/huntsx/H.cc", &a).await.unwrap();

        let listed = store.list(HUNTS_NAMESPACE).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryHuntStore::new();
        store.set_fail_puts(true);
        let err = store.put("/hunts/H.aa", &paused_hunt("H.aa")).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
        assert!(store.is_empty().await);

        store.set_fail_lists(true);
        assert!(store.list(HUNTS_NAMESPACE).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_record_surfaces_serialization_error() {
        let store = MemoryHuntStore::new();
        store.put_raw("/hunts/H.bad", b"not json".to_vec()).await;
        let err = store.get("/hunts/H.bad").await.unwrap_err();
        assert_eq!(err.kind(), "serialization");

        store.put("/hunts/H.good", &paused_hunt("H.good")).await.unwrap();
        let listed = store.list(HUNTS_NAMESPACE).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
