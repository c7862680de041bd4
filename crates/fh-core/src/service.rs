//! Hunt orchestration: create, modify, list and get.
//!
//! [`HuntService`] validates requests, compiles them, persists hunts and
//! drives the dispatcher. Reads are answered from the dispatcher's mirror
//! only. Calls to the compiler, notifier, journal and download index are
//! made outside any dispatcher lock.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::access::AccessContext;
use crate::artifacts::ArtifactRepository;
use crate::compiler::{ArtifactCompiler, CompileError};
use crate::config::HuntServiceConfig;
use crate::dispatcher::{DispatcherError, HuntDispatcher, Mutation};
use crate::downloads::{DownloadIndex, MemoryDownloadIndex};
use crate::error::{HuntError, PostCommitStage};
use crate::hunt::{
    now_micros, Hunt, HuntId, HuntIdGenerator, HuntModification, HuntPaths, HuntState, HuntStats,
    RandomHuntIdGenerator, StartRequest, TransitionEffect,
};
use crate::journal::{Journal, JournalMetadata, MemoryJournal};
use crate::notifier::Notifier;

/// A request to create a hunt.
#[derive(Debug, Clone, Default)]
pub struct HuntRequest {
    /// Identifier to use instead of a generated one.
    pub hunt_id: Option<HuntId>,
    pub description: String,
    pub start_request: Option<StartRequest>,
    /// Defaults to now plus the configured expiry.
    pub expires: Option<DateTime<Utc>>,
    /// `Unset` or `Paused` create a paused hunt, `Running` starts it.
    pub state: HuntState,
    pub stats: Option<HuntStats>,
}

impl HuntRequest {
    /// Creates a request collecting `start_request`.
    pub fn new(start_request: StartRequest) -> Self {
        Self {
            start_request: Some(start_request),
            ..Default::default()
        }
    }

    pub fn with_hunt_id(mut self, hunt_id: HuntId) -> Self {
        self.hunt_id = Some(hunt_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_state(mut self, state: HuntState) -> Self {
        self.state = state;
        self
    }

    /// Creates the hunt in the running state.
    pub fn running(self) -> Self {
        self.with_state(HuntState::Running)
    }
}

/// Paging and filtering of [`HuntService::list_hunts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHuntsRequest {
    pub offset: usize,
    pub count: usize,
    pub include_archived: bool,
}

impl ListHuntsRequest {
    pub fn new(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count,
            include_archived: false,
        }
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }
}

impl Default for ListHuntsRequest {
    fn default() -> Self {
        Self::new(0, 50)
    }
}

/// The hunt orchestration service.
pub struct HuntService {
    dispatcher: Arc<HuntDispatcher>,
    repository: Arc<dyn ArtifactRepository>,
    compiler: Arc<dyn ArtifactCompiler>,
    notifier: Option<Arc<dyn Notifier>>,
    journal: Arc<dyn Journal>,
    downloads: Arc<dyn DownloadIndex>,
    ids: Arc<dyn HuntIdGenerator>,
    config: HuntServiceConfig,
}

impl HuntService {
    /// Starts building a service around `dispatcher`.
    pub fn builder(
        dispatcher: Arc<HuntDispatcher>,
        repository: Arc<dyn ArtifactRepository>,
        compiler: Arc<dyn ArtifactCompiler>,
    ) -> HuntServiceBuilder {
        HuntServiceBuilder::new(dispatcher, repository, compiler)
    }

    pub fn dispatcher(&self) -> &Arc<HuntDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &HuntServiceConfig {
        &self.config
    }

    /// Creates a hunt and returns its id.
    ///
    /// The request is validated and compiled before anything is written.
    /// Cancelling `cancel` aborts the compile step; once the hunt is being
    /// persisted the call runs to completion. Failures of the follow-up
    /// refresh or notification are returned as [`HuntError::PostCommit`].
    #[instrument(skip_all, fields(principal = %access.principal))]
    pub async fn create_hunt(
        &self,
        request: HuntRequest,
        access: &AccessContext,
        cancel: &CancellationToken,
    ) -> Result<HuntId, HuntError> {
        let HuntRequest {
            hunt_id,
            description,
            start_request,
            expires,
            state,
            stats,
        } = request;

        let start_request = start_request
            .filter(|r| !r.artifacts.is_empty())
            .ok_or_else(|| HuntError::validation("No artifacts to collect."))?;
        if start_request.artifacts.iter().any(|a| a.trim().is_empty()) {
            return Err(HuntError::validation("Artifact names must not be empty"));
        }

        let hunt_id = match hunt_id {
            Some(id) => {
                // Checked again under the hunt's lock when the record is written.
                if self.dispatcher.contains(&id).await {
                    return Err(DispatcherError::AlreadyExists(id).into());
                }
                id
            }
            None => self.ids.generate(),
        };
        let mut stats = stats.unwrap_or_default();
        stats.available_downloads = None;

        let create_time = now_micros();
        let expires = match expires {
            Some(expires) => expires.trunc_subsecs(6),
            None => {
                let lifetime = chrono::Duration::from_std(self.config.default_expiry)
                    .map_err(|_| HuntError::validation("Default expiry is out of range"))?;
                create_time + lifetime
            }
        };
        if expires < create_time {
            return Err(HuntError::validation("Hunt expiry is in the past!"));
        }

        let artifact_sources = self.collected_sources(&start_request.artifacts)?;

        let compiled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HuntError::Cancelled),
            compiled = self.compiler.compile(
                access,
                self.repository.as_ref(),
                true,
                &start_request,
            ) => compiled?,
        };

        let (state, start_time) = match state {
            HuntState::Unset | HuntState::Paused => (HuntState::Paused, None),
            HuntState::Running => {
                if self.notifier.is_none() {
                    return Err(HuntError::NotifierUnavailable);
                }
                if stats.stopped {
                    return Err(HuntError::validation("Can not start a stopped hunt"));
                }
                (HuntState::Running, Some(create_time))
            }
            other => {
                return Err(HuntError::validation(format!(
                    "Hunts can not be created in state {}",
                    other
                )));
            }
        };

        let hunt = Hunt {
            hunt_id: hunt_id.clone(),
            description,
            creator: access.principal.clone(),
            state,
            create_time,
            start_time,
            expires,
            artifacts: start_request.artifacts.clone(),
            artifact_sources,
            start_request,
            compiled_request: compiled,
            stats: Some(stats),
        };

        let artifact_count = hunt.artifacts.len();
        self.dispatcher.insert_new(hunt).await?;
        metrics::counter!("fh_hunts_created_total", "state" => state.to_string()).increment(1);
        info!(hunt_id = %hunt_id, %state, artifacts = artifact_count, "Hunt created");

        self.dispatcher
            .refresh()
            .await
            .map_err(|e| HuntError::post_commit(&hunt_id, PostCommitStage::Refresh, e))?;

        if state == HuntState::Running {
            self.notify_clients()
                .await
                .map_err(|e| HuntError::post_commit(&hunt_id, PostCommitStage::Notify, e))?;
        }

        Ok(hunt_id)
    }

    /// Applies one modification to a hunt on behalf of `user`.
    ///
    /// Archiving appends a row to the archive journal. Every committed change
    /// wakes the clients so they pick it up. Both happen after the commit and
    /// failures there are returned as [`HuntError::PostCommit`].
    #[instrument(skip_all, fields(hunt_id = %hunt_id, user = %user, modification = ?modification))]
    pub async fn modify_hunt(
        &self,
        hunt_id: &HuntId,
        modification: HuntModification,
        user: &str,
    ) -> Result<TransitionEffect, HuntError> {
        if self.notifier.is_none() {
            return Err(HuntError::NotifierUnavailable);
        }

        let now = now_micros();
        let mut applied = None;
        let result = self
            .dispatcher
            .modify_hunt(hunt_id, |hunt| {
                let effect = hunt.apply(&modification, now)?;
                let archived = (effect == TransitionEffect::Archived).then(|| hunt.clone());
                applied = Some((effect, archived));
                Ok::<_, HuntError>(Mutation::Commit)
            })
            .await;

        if let Err(e) = result {
            metrics::counter!("fh_hunt_modifications_total", "outcome" => e.kind()).increment(1);
            return Err(e);
        }
        let Some((effect, archived)) = applied else {
            return Err(HuntError::NotFound(hunt_id.to_string()));
        };
        metrics::counter!("fh_hunt_modifications_total", "outcome" => effect.as_str()).increment(1);
        info!(effect = effect.as_str(), "Hunt modified");

        if let Some(hunt) = archived {
            let row = json!({
                "Timestamp": now.timestamp(),
                "Hunt": hunt,
                "User": user,
            });
            self.journal
                .append_row(
                    &self.config.archive_artifact,
                    &self.config.journal_source,
                    JournalMetadata::for_hunt(hunt_id),
                    row,
                )
                .await
                .map_err(|e| HuntError::post_commit(hunt_id, PostCommitStage::Journal, e))?;
        }

        self.notify_clients()
            .await
            .map_err(|e| HuntError::post_commit(hunt_id, PostCommitStage::Notify, e))?;

        Ok(effect)
    }

    /// Returns a page of hunts, newest first.
    ///
    /// `offset` matching hunts are skipped before up to `count` are
    /// collected; `count` is capped at the configured maximum. Archived
    /// hunts only match when requested.
    pub async fn list_hunts(&self, request: ListHuntsRequest) -> Result<Vec<Hunt>, HuntError> {
        let count = request.count.min(self.config.max_list_count);
        let mut hunts = Vec::with_capacity(count.min(256));
        if count == 0 {
            return Ok(hunts);
        }

        let mut skipped = 0usize;
        self.dispatcher
            .apply_func_on_hunts(|hunt| {
                if !request.include_archived && hunt.state() == HuntState::Archived {
                    return Ok::<_, HuntError>(ControlFlow::Continue(()));
                }
                if skipped < request.offset {
                    skipped += 1;
                    return Ok(ControlFlow::Continue(()));
                }
                hunts.push(hunt.clone());
                if hunts.len() >= count {
                    Ok(ControlFlow::Break(()))
                } else {
                    Ok(ControlFlow::Continue(()))
                }
            })
            .await?;

        hunts.sort_by(|a, b| {
            b.create_time()
                .cmp(&a.create_time())
                .then_with(|| a.hunt_id().cmp(b.hunt_id()))
        });
        Ok(hunts)
    }

    /// Returns a copy of one hunt with its available downloads attached.
    ///
    /// A failing download lookup is logged and the hunt is returned without
    /// a manifest.
    #[instrument(skip_all, fields(hunt_id = %hunt_id))]
    pub async fn get_hunt(&self, hunt_id: &HuntId) -> Result<Hunt, HuntError> {
        let mut found = None;
        self.dispatcher
            .modify_hunt(hunt_id, |hunt| {
                found = Some(hunt.clone());
                Ok::<_, HuntError>(Mutation::Unchanged)
            })
            .await?;

        let mut hunt = match found {
            Some(hunt) if hunt.stats.is_some() => hunt,
            _ => return Err(HuntError::NotFound(hunt_id.to_string())),
        };

        if hunt.artifacts().is_empty() {
            let sources = hunt
                .start_request()
                .artifacts
                .iter()
                .flat_map(|name| self.repository.resolve(name).unwrap_or_default())
                .collect();
            hunt.backfill_artifacts(sources);
        }

        let downloads_dir = HuntPaths::new(hunt_id).downloads_dir();
        match self.downloads.list_available(&downloads_dir).await {
            Ok(downloads) => hunt.stats_mut().available_downloads = Some(downloads),
            Err(e) => warn!(error = %e, path = %downloads_dir, "Failed to list hunt downloads"),
        }

        Ok(hunt)
    }

    /// Resolves every requested artifact into its `artifact/source` paths.
    fn collected_sources(&self, artifacts: &[String]) -> Result<Vec<String>, CompileError> {
        let mut sources = Vec::new();
        for name in artifacts {
            let resolved = self
                .repository
                .resolve(name)
                .ok_or_else(|| CompileError::UnknownArtifact(name.clone()))?;
            sources.extend(resolved);
        }
        Ok(sources)
    }

    async fn notify_clients(&self) -> Result<usize, HuntError> {
        let notifier = self.notifier.as_ref().ok_or(HuntError::NotifierUnavailable)?;
        Ok(notifier.notify_matching(&self.config.wakeup_pattern).await?)
    }
}

impl std::fmt::Debug for HuntService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuntService")
            .field("dispatcher", &self.dispatcher)
            .field("has_notifier", &self.notifier.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`HuntService`].
pub struct HuntServiceBuilder {
    dispatcher: Arc<HuntDispatcher>,
    repository: Arc<dyn ArtifactRepository>,
    compiler: Arc<dyn ArtifactCompiler>,
    notifier: Option<Arc<dyn Notifier>>,
    journal: Option<Arc<dyn Journal>>,
    downloads: Option<Arc<dyn DownloadIndex>>,
    ids: Option<Arc<dyn HuntIdGenerator>>,
    config: HuntServiceConfig,
}

impl HuntServiceBuilder {
    pub fn new(
        dispatcher: Arc<HuntDispatcher>,
        repository: Arc<dyn ArtifactRepository>,
        compiler: Arc<dyn ArtifactCompiler>,
    ) -> Self {
        Self {
            dispatcher,
            repository,
            compiler,
            notifier: None,
            journal: None,
            downloads: None,
            ids: None,
            config: HuntServiceConfig::default(),
        }
    }

    /// Sets the client notifier. Without one, starting hunts and modifying
    /// them fails with [`HuntError::NotifierUnavailable`].
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the journal. Defaults to an in-memory journal.
    pub fn with_journal(mut self, journal: Arc<dyn Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Sets the download index. Defaults to an empty in-memory index.
    pub fn with_download_index(mut self, downloads: Arc<dyn DownloadIndex>) -> Self {
        self.downloads = Some(downloads);
        self
    }

    /// Sets the id generator. Defaults to [`RandomHuntIdGenerator`].
    pub fn with_id_generator(mut self, ids: Arc<dyn HuntIdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_config(mut self, config: HuntServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> HuntService {
        HuntService {
            dispatcher: self.dispatcher,
            repository: self.repository,
            compiler: self.compiler,
            notifier: self.notifier,
            journal: self
                .journal
                .unwrap_or_else(|| Arc::new(MemoryJournal::default())),
            downloads: self
                .downloads
                .unwrap_or_else(|| Arc::new(MemoryDownloadIndex::new())),
            ids: self.ids.unwrap_or_else(|| Arc::new(RandomHuntIdGenerator)),
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::MemoryArtifactRepository;
    use crate::compiler::TemplateCompiler;
    use crate::notifier::ClientNotifier;
    use crate::store::MemoryHuntStore;

    const ARTIFACTS: &str = r#"
name: Generic.Client.Info
sources:
  - name: BasicInformation
    query: SELECT * FROM info()
  - name: Users
    query: SELECT * FROM users()
"#;

    struct Fixture {
        store: Arc<MemoryHuntStore>,
        journal: Arc<MemoryJournal>,
        notifier: Arc<ClientNotifier>,
        service: HuntService,
    }

    async fn fixture(with_notifier: bool) -> Fixture {
        let store = Arc::new(MemoryHuntStore::new());
        let dispatcher = Arc::new(HuntDispatcher::new(store.clone()));
        dispatcher.refresh().await.unwrap();
        let repository = Arc::new(MemoryArtifactRepository::from_yaml_str(ARTIFACTS).unwrap());
        let journal = Arc::new(MemoryJournal::without_tracing(100));
        let notifier = Arc::new(ClientNotifier::default());

        let mut builder = HuntService::builder(dispatcher, repository, Arc::new(TemplateCompiler))
            .with_journal(journal.clone());
        if with_notifier {
            builder = builder.with_notifier(notifier.clone());
        }
        Fixture {
            store,
            journal,
            notifier,
            service: builder.build(),
        }
    }

    fn request() -> HuntRequest {
        HuntRequest::new(StartRequest::new(["Generic.Client.Info"])).with_description("info")
    }

    fn admin() -> AccessContext {
        AccessContext::administrator("admin")
    }

    #[tokio::test]
    async fn test_create_derives_sources_and_compiles() {
        let f = fixture(true).await;
        let id = f
            .service
            .create_hunt(request(), &admin(), &CancellationToken::new())
            .await
            .unwrap();

        let hunt = f.service.get_hunt(&id).await.unwrap();
        assert_eq!(hunt.state(), HuntState::Paused);
        assert_eq!(hunt.creator(), "admin");
        assert_eq!(
            hunt.artifact_sources(),
            [
                "Generic.Client.Info/BasicInformation".to_string(),
                "Generic.Client.Info/Users".to_string()
            ]
        );
        assert_eq!(hunt.compiled_request().len(), 1);
        assert!(hunt.compiled_request()[0].artifact.starts_with("obf_"));
        assert!(hunt.start_time().is_none());
    }

    #[tokio::test]
    async fn test_create_running_notifies_clients() {
        let f = fixture(true).await;
        f.notifier.register("C.100").await;
        f.notifier.register("server").await;
        let mut rx = f.notifier.subscribe();

        let id = f
            .service
            .create_hunt(request().running(), &admin(), &CancellationToken::new())
            .await
            .unwrap();

        let hunt = f.service.get_hunt(&id).await.unwrap();
        assert_eq!(hunt.state(), HuntState::Running);
        assert_eq!(hunt.start_time(), Some(hunt.create_time()));
        assert_eq!(rx.recv().await.unwrap().client_id, "C.100");
        assert_eq!(f.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_create_running_without_notifier_persists_nothing() {
        let f = fixture(false).await;
        let err = f
            .service
            .create_hunt(request().running(), &admin(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HuntError::NotifierUnavailable));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_requests() {
        let f = fixture(true).await;
        let cancel = CancellationToken::new();

        let err = f
            .service
            .create_hunt(HuntRequest::default(), &admin(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = f
            .service
            .create_hunt(request().with_state(HuntState::Stopped), &admin(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = f
            .service
            .create_hunt(
                HuntRequest::new(StartRequest::new(["Unknown.Artifact"])),
                &admin(),
                &cancel,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "compile");

        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let f = fixture(true).await;
        let cancel = CancellationToken::new();
        let id: HuntId = "H.fixed".parse().unwrap();
        f.service
            .create_hunt(request().with_hunt_id(id.clone()), &admin(), &cancel)
            .await
            .unwrap();

        let err = f
            .service
            .create_hunt(request().with_hunt_id(id), &admin(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_compile() {
        let f = fixture(true).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = f
            .service
            .create_hunt(request(), &admin(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, HuntError::Cancelled));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_failure_reported_with_hunt_id() {
        let f = fixture(true).await;
        f.store.set_fail_lists(true);
        let err = f
            .service
            .create_hunt(request(), &admin(), &CancellationToken::new())
            .await
            .unwrap_err();
        let id = err.hunt_id().cloned().unwrap();
        assert_eq!(f.store.put_count(), 1);

        f.store.set_fail_lists(false);
        f.service.dispatcher().refresh().await.unwrap();
        assert!(f.service.get_hunt(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_archive_writes_journal_row() {
        let f = fixture(true).await;
        let id = f
            .service
            .create_hunt(request(), &admin(), &CancellationToken::new())
            .await
            .unwrap();

        let effect = f
            .service
            .modify_hunt(&id, HuntModification::archive(), "alice")
            .await
            .unwrap();
        assert_eq!(effect, TransitionEffect::Archived);

        let rows = f.journal.entries_for_artifact("System.Hunt.Archive").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "server");
        assert_eq!(rows[0].row["User"], "alice");
        assert_eq!(rows[0].row["Hunt"]["state"], "ARCHIVED");
        assert_eq!(rows[0].metadata.hunt_id.as_ref(), Some(&id));
    }

    #[tokio::test]
    async fn test_modify_requires_notifier() {
        let f = fixture(false).await;
        let id = f
            .service
            .create_hunt(request(), &admin(), &CancellationToken::new())
            .await
            .unwrap();
        let puts = f.store.put_count();

        let err = f
            .service
            .modify_hunt(&id, HuntModification::start(), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, HuntError::NotifierUnavailable));
        assert_eq!(f.store.put_count(), puts);
    }

    #[tokio::test]
    async fn test_get_attaches_downloads_and_tolerates_failure() {
        let store = Arc::new(MemoryHuntStore::new());
        let dispatcher = Arc::new(HuntDispatcher::new(store));
        let repository = Arc::new(MemoryArtifactRepository::from_yaml_str(ARTIFACTS).unwrap());
        let downloads = Arc::new(MemoryDownloadIndex::new());
        let service = HuntService::builder(dispatcher, repository, Arc::new(TemplateCompiler))
            .with_download_index(downloads.clone())
            .build();

        let id = service
            .create_hunt(request(), &admin(), &CancellationToken::new())
            .await
            .unwrap();
        downloads
            .publish(&HuntPaths::new(&id).downloads_dir(), "export.zip", 42)
            .await;

        let hunt = service.get_hunt(&id).await.unwrap();
        let manifest = hunt.stats.as_ref().and_then(|s| s.available_downloads.clone());
        assert_eq!(manifest.map(|m| m.total_size()), Some(42));

        downloads.set_fail(true);
        let hunt = service.get_hunt(&id).await.unwrap();
        assert!(hunt.stats.unwrap().available_downloads.is_none());
    }

    #[tokio::test]
    async fn test_list_clamps_count() {
        let store = Arc::new(MemoryHuntStore::new());
        let dispatcher = Arc::new(HuntDispatcher::new(store));
        let repository = Arc::new(MemoryArtifactRepository::from_yaml_str(ARTIFACTS).unwrap());
        let service = HuntService::builder(dispatcher, repository, Arc::new(TemplateCompiler))
            .with_config(HuntServiceConfig::default().with_max_list_count(2))
            .build();
        for _ in 0..3 {
            service
                .create_hunt(request(), &admin(), &CancellationToken::new())
                .await
                .unwrap();
        }

        let page = service.list_hunts(ListHuntsRequest::new(0, 100)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(service
            .list_hunts(ListHuntsRequest::new(0, 0))
            .await
            .unwrap()
            .is_empty());
    }
}
