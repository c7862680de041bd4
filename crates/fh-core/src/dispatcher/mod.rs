//! The hunt dispatcher: an in-memory mirror of every hunt.
//!
//! The dispatcher is the single serialization point for hunt mutations.
//! Readers iterate a published snapshot under a shared lock and never wait
//! on store I/O. Writers go through [`HuntDispatcher::modify_hunt`], which
//! linearizes calls per hunt id, writes the store first and then publishes
//! to the mirror.
//!
//! # Refresh and local commits
//!
//! [`HuntDispatcher::refresh`] loads the whole hunt namespace off-lock and
//! swaps it in. Every local commit is stamped with a monotonically increasing
//! epoch; entries committed after a refresh started are carried over into the
//! new snapshot, so a slow refresh never rolls back a concurrent commit.

mod mirror;
mod refresh;

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

use crate::hunt::{Hunt, HuntId, HuntPaths};
use crate::store::{HuntStore, StoreError};

use mirror::Mirror;

/// Outcome of a mutator passed to [`HuntDispatcher::modify_hunt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Write the modified copy to the store and the mirror.
    Commit,
    /// Discard the copy. Nothing is written.
    Unchanged,
}

/// Errors raised by the dispatcher itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("Hunt not found: {0}")]
    NotFound(HuntId),

    #[error("Hunt {0} already exists")]
    AlreadyExists(HuntId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatcherError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Store(e) => e.kind(),
        }
    }
}

/// Authoritative in-memory mirror of the hunt table.
pub struct HuntDispatcher {
    store: Arc<dyn HuntStore>,
    mirror: RwLock<Mirror>,
    hunt_locks: Mutex<HashMap<HuntId, Arc<Mutex<()>>>>,
    refresh_lock: Mutex<()>,
    commit_epoch: AtomicU64,
    refresh_count: AtomicU64,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl HuntDispatcher {
    /// Creates a dispatcher with an empty mirror. Call
    /// [`refresh`](Self::refresh) to load existing hunts.
    pub fn new(store: Arc<dyn HuntStore>) -> Self {
        Self {
            store,
            mirror: RwLock::new(Mirror::default()),
            hunt_locks: Mutex::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
            commit_epoch: AtomicU64::new(0),
            refresh_count: AtomicU64::new(0),
            last_refresh: RwLock::new(None),
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn HuntStore> {
        &self.store
    }

    /// Number of hunts in the mirror, archived ones included.
    pub async fn len(&self) -> usize {
        self.mirror.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns true if the mirror knows the hunt.
    pub async fn contains(&self, hunt_id: &HuntId) -> bool {
        self.mirror.read().await.contains(hunt_id)
    }

    /// When the last successful refresh finished.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.read().await
    }

    /// Number of successful refreshes so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Gets or creates the lock serializing mutations of one hunt.
    async fn hunt_lock(&self, hunt_id: &HuntId) -> Arc<Mutex<()>> {
        let mut locks = self.hunt_locks.lock().await;
        locks
            .entry(hunt_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `mutator` on an exclusively owned copy of a hunt.
    ///
    /// Calls on the same hunt are linearized. When the mutator returns
    /// [`Mutation::Commit`] the copy is written to the store and then
    /// published to the mirror, both while the hunt's lock is held. On
    /// [`Mutation::Unchanged`] or an error nothing is written, which makes a
    /// read-only mutator a consistent read of the hunt.
    ///
    /// The mutator is synchronous and must not do anything besides editing
    /// the copy. Follow-up I/O belongs after this call returns.
    #[instrument(skip_all, fields(hunt_id = %hunt_id))]
    pub async fn modify_hunt<F, E>(&self, hunt_id: &HuntId, mutator: F) -> Result<Mutation, E>
    where
        F: FnOnce(&mut Hunt) -> Result<Mutation, E> + Send,
        E: From<DispatcherError> + Send,
    {
        // Lookups of unknown ids never get an entry in the lock table.
        if !self.contains(hunt_id).await {
            return Err(DispatcherError::NotFound(hunt_id.clone()).into());
        }

        let lock = self.hunt_lock(hunt_id).await;
        let _guard = lock.lock().await;

        let mut copy = {
            let mirror = self.mirror.read().await;
            mirror
                .get(hunt_id)
                .map(|entry| entry.hunt.clone())
                .ok_or_else(|| DispatcherError::NotFound(hunt_id.clone()))?
        };

        match mutator(&mut copy)? {
            Mutation::Unchanged => Ok(Mutation::Unchanged),
            Mutation::Commit => {
                let path = HuntPaths::new(hunt_id).record();
                self.store
                    .put(&path, &copy)
                    .await
                    .map_err(DispatcherError::from)?;

                let epoch = self.commit_epoch.fetch_add(1, Ordering::SeqCst) + 1;
                self.mirror.write().await.insert(copy, epoch);
                debug!(epoch, "Committed hunt modification");
                Ok(Mutation::Commit)
            }
        }
    }

    /// Persists a new hunt and publishes it to the mirror.
    ///
    /// Runs under the hunt's lock, so concurrent inserts of one id are
    /// linearized. The id must be unknown to both the mirror and the store;
    /// a record written by another process that the mirror has not picked up
    /// yet still counts as taken.
    #[instrument(skip_all, fields(hunt_id = %hunt.hunt_id()))]
    pub async fn insert_new(&self, hunt: Hunt) -> Result<(), DispatcherError> {
        let hunt_id = hunt.hunt_id().clone();
        let lock = self.hunt_lock(&hunt_id).await;
        let _guard = lock.lock().await;

        if self.contains(&hunt_id).await {
            return Err(DispatcherError::AlreadyExists(hunt_id));
        }
        let path = HuntPaths::new(&hunt_id).record();
        match self.store.get(&path).await {
            Ok(_) => return Err(DispatcherError::AlreadyExists(hunt_id)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        self.store.put(&path, &hunt).await?;
        let epoch = self.commit_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.mirror.write().await.insert(hunt, epoch);
        debug!(epoch, "Inserted new hunt");
        Ok(())
    }

    /// Calls `f` on every hunt, newest first, until it returns
    /// `ControlFlow::Break`.
    ///
    /// The callback sees the published snapshot and runs under the mirror's
    /// shared lock, so it must not call back into the dispatcher's write
    /// paths.
    pub async fn apply_func_on_hunts<F, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Hunt) -> Result<ControlFlow<()>, E>,
    {
        let mirror = self.mirror.read().await;
        for hunt in mirror.hunts() {
            if f(hunt)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HuntDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuntDispatcher")
            .field("commit_epoch", &self.commit_epoch.load(Ordering::Relaxed))
            .field("refresh_count", &self.refresh_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunt::fixtures::paused_hunt;
    use crate::hunt::{now_micros, HuntModification};
    use crate::store::MemoryHuntStore;

    async fn dispatcher_with(ids: &[&str]) -> (Arc<MemoryHuntStore>, HuntDispatcher) {
        let store = Arc::new(MemoryHuntStore::new());
        for id in ids {
            let hunt = paused_hunt(id);
            store
                .put(&HuntPaths::new(hunt.hunt_id()).record(), &hunt)
                .await
                .unwrap();
        }
        let dispatcher = HuntDispatcher::new(store.clone());
        dispatcher.refresh().await.unwrap();
        (store, dispatcher)
    }

    #[tokio::test]
    async fn test_commit_writes_store_and_mirror() {
        let (store, dispatcher) = dispatcher_with(&["H.01"]).await;
        let id: HuntId = "H.01".parse().unwrap();
        let puts_before = store.put_count();

        let outcome = dispatcher
            .modify_hunt(&id, |hunt| {
                hunt.apply(&HuntModification::describe("edited"), now_micros())
                    .unwrap();
                Ok::<_, DispatcherError>(Mutation::Commit)
            })
            .await
            .unwrap();

        assert_eq!(outcome, Mutation::Commit);
        assert_eq!(store.put_count(), puts_before + 1);
        let stored = store.get("/hunts/H.01").await.unwrap();
        assert_eq!(stored.description(), "edited");

        let mut seen = None;
        dispatcher
            .modify_hunt(&id, |hunt| {
                seen = Some(hunt.description().to_string());
                Ok::<_, DispatcherError>(Mutation::Unchanged)
            })
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("edited"));
    }

    #[tokio::test]
    async fn test_unchanged_and_errors_write_nothing() {
        let (store, dispatcher) = dispatcher_with(&["H.01"]).await;
        let id: HuntId = "H.01".parse().unwrap();
        let puts_before = store.put_count();

        dispatcher
            .modify_hunt(&id, |hunt| {
                hunt.stats_mut().clients_scheduled = 99;
                Ok::<_, DispatcherError>(Mutation::Unchanged)
            })
            .await
            .unwrap();

        let err = dispatcher
            .modify_hunt(&id, |hunt| {
                hunt.stats_mut().clients_scheduled = 99;
                Err::<Mutation, _>(DispatcherError::NotFound(hunt.hunt_id().clone()))
            })
            .await;
        assert!(err.is_err());
        assert_eq!(store.put_count(), puts_before);

        let mut scheduled = None;
        dispatcher
            .apply_func_on_hunts(|hunt| {
                scheduled = hunt.stats.as_ref().map(|s| s.clients_scheduled);
                Ok::<_, DispatcherError>(ControlFlow::Continue(()))
            })
            .await
            .unwrap();
        assert_eq!(scheduled, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_hunt_is_not_found() {
        let (_store, dispatcher) = dispatcher_with(&[]).await;
        let id: HuntId = "H.missing".parse().unwrap();
        let err = dispatcher
            .modify_hunt(&id, |_| Ok::<_, DispatcherError>(Mutation::Unchanged))
            .await
            .unwrap_err();
        assert_eq!(err, DispatcherError::NotFound(id));
        assert!(dispatcher.hunt_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_mirror_untouched() {
        let (store, dispatcher) = dispatcher_with(&["H.01"]).await;
        let id: HuntId = "H.01".parse().unwrap();
        store.set_fail_puts(true);

        let err = dispatcher
            .modify_hunt(&id, |hunt| {
                hunt.stats_mut().clients_completed = 5;
                Ok::<_, DispatcherError>(Mutation::Commit)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unavailable");

        let mut completed = None;
        dispatcher
            .modify_hunt(&id, |hunt| {
                completed = hunt.stats.as_ref().map(|s| s.clients_completed);
                Ok::<_, DispatcherError>(Mutation::Unchanged)
            })
            .await
            .unwrap();
        assert_eq!(completed, Some(0));
    }

    #[tokio::test]
    async fn test_insert_new_rejects_taken_ids() {
        let (store, dispatcher) = dispatcher_with(&["H.01"]).await;

        dispatcher.insert_new(paused_hunt("H.02")).await.unwrap();
        assert!(dispatcher.contains(&"H.02".parse().unwrap()).await);
        assert!(store.get("/hunts/H.02").await.is_ok());

        let err = dispatcher.insert_new(paused_hunt("H.01")).await.unwrap_err();
        assert_eq!(err, DispatcherError::AlreadyExists("H.01".parse().unwrap()));

        // Written by someone else, not yet mirrored.
        store.put("/hunts/H.03", &paused_hunt("H.03")).await.unwrap();
        let puts_before = store.put_count();
        let err = dispatcher.insert_new(paused_hunt("H.03")).await.unwrap_err();
        assert_eq!(err.kind(), "already_exists");
        assert_eq!(store.put_count(), puts_before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_of_one_id_admit_one() {
        let (store, dispatcher) = dispatcher_with(&[]).await;
        let dispatcher = Arc::new(dispatcher);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move { dispatcher.insert_new(paused_hunt("H.same")).await });
        }
        let mut admitted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(()) => admitted += 1,
                Err(e) => assert_eq!(e.kind(), "already_exists"),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_break_stops_iteration() {
        let (_store, dispatcher) = dispatcher_with(&["H.01", "H.02", "H.03"]).await;
        let mut visited = 0;
        dispatcher
            .apply_func_on_hunts(|_| {
                visited += 1;
                Ok::<_, DispatcherError>(ControlFlow::Break(()))
            })
            .await
            .unwrap();
        assert_eq!(visited, 1);
    }
}
