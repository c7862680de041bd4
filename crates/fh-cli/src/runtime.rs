//! Wiring of the hunt service from the application configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use fh_core::{
    ClientNotifier, FileHuntStore, FsDownloadIndex, HuntDispatcher, HuntService, JsonlJournal,
    TemplateCompiler, YamlArtifactRepository,
};

use crate::config::AppConfig;

/// A hunt service backed by the on-disk store, plus the notifier it wakes
/// clients through.
pub struct Runtime {
    pub service: Arc<HuntService>,
    pub notifier: Arc<ClientNotifier>,
}

impl Runtime {
    /// Builds the service and loads the current hunt table into the mirror.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let data_dir = &config.storage.data_dir;

        let repository = YamlArtifactRepository::load_dir(&config.artifacts.definitions_dir)
            .with_context(|| {
                format!(
                    "Failed to load artifact definitions from {}",
                    config.artifacts.definitions_dir.display()
                )
            })?;
        tracing::debug!(
            definitions = repository.len(),
            dir = %repository.dir().display(),
            "Loaded artifact definitions"
        );

        let store = Arc::new(FileHuntStore::new(data_dir));
        let dispatcher = Arc::new(HuntDispatcher::new(store));
        let loaded = dispatcher
            .refresh()
            .await
            .with_context(|| format!("Failed to load hunts from {}", data_dir.display()))?;
        tracing::debug!(hunts = loaded, "Dispatcher mirror loaded");

        let notifier = Arc::new(ClientNotifier::default());
        let repository = Arc::new(repository);
        let service = HuntService::builder(dispatcher, repository, Arc::new(TemplateCompiler))
            .with_notifier(notifier.clone())
            .with_journal(Arc::new(JsonlJournal::new(config.storage.journal_dir())))
            .with_download_index(Arc::new(FsDownloadIndex::new(data_dir)))
            .with_config(config.service_config())
            .build();

        Ok(Self {
            service: Arc::new(service),
            notifier,
        })
    }
}
