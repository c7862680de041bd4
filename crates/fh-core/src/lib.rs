//! # fh-core
//!
//! Hunt lifecycle and dispatch for Fleet Hunt.
//!
//! This crate provides the durable hunt entity and its state machine, the
//! in-memory [`HuntDispatcher`] that mirrors the hunt table, and the
//! [`HuntService`] orchestration layer, together with the collaborators they
//! talk to: hunt stores, artifact repositories, the compiler, the client
//! notifier, the journal and the download index.

pub mod access;
pub mod artifacts;
pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod downloads;
pub mod error;
pub mod hunt;
pub mod journal;
pub mod notifier;
pub mod service;
pub mod store;

pub use access::{AccessContext, Permission};
pub use artifacts::{
    ArtifactDefinition, ArtifactError, ArtifactRepository, MemoryArtifactRepository,
    YamlArtifactRepository,
};
pub use compiler::{ArtifactCompiler, CompileError, CompiledCollectorArgs, TemplateCompiler};
pub use config::HuntServiceConfig;
pub use dispatcher::{DispatcherError, HuntDispatcher, Mutation};
pub use downloads::{AvailableDownloads, DownloadIndex, FsDownloadIndex, MemoryDownloadIndex};
pub use error::{HuntError, PostCommitStage};
pub use hunt::{
    Hunt, HuntId, HuntIdGenerator, HuntModification, HuntState, HuntStats, RandomHuntIdGenerator,
    StartRequest, TransitionEffect, TransitionError,
};
pub use journal::{Journal, JsonlJournal, MemoryJournal};
pub use notifier::{ClientNotifier, Notifier, NotifyError};
pub use service::{HuntRequest, HuntService, HuntServiceBuilder, ListHuntsRequest};
pub use store::{FileHuntStore, HuntStore, MemoryHuntStore, StoreError};

/// Re-exported so callers can pass cancellation tokens without depending on
/// `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
