//! Errors returned by [`HuntService`](crate::service::HuntService).

use std::fmt;
use thiserror::Error;

use crate::compiler::CompileError;
use crate::dispatcher::DispatcherError;
use crate::hunt::{HuntId, TransitionError};
use crate::journal::JournalError;
use crate::notifier::NotifyError;
use crate::store::StoreError;

/// The step that failed after a hunt was already durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCommitStage {
    Refresh,
    Notify,
    Journal,
}

impl fmt::Display for PostCommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh => write!(f, "refresh"),
            Self::Notify => write!(f, "notify"),
            Self::Journal => write!(f, "journal"),
        }
    }
}

/// Errors returned by hunt operations.
///
/// Validation errors are reported before anything is written. A
/// [`PostCommit`](Self::PostCommit) error means the hunt was persisted and a
/// follow-up step failed; the write is not rolled back.
#[derive(Error, Debug)]
pub enum HuntError {
    #[error("Invalid hunt request: {0}")]
    Validation(String),

    #[error("Hunt not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Hunt store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to compile hunt request: {0}")]
    Compile(#[from] CompileError),

    #[error("Failed to notify clients: {0}")]
    Notify(#[from] NotifyError),

    #[error("No client notifier is configured")]
    NotifierUnavailable,

    #[error("Failed to write journal: {0}")]
    Journal(#[from] JournalError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Hunt {hunt_id} was saved but the {stage} step failed: {source}")]
    PostCommit {
        hunt_id: HuntId,
        stage: PostCommitStage,
        #[source]
        source: Box<HuntError>,
    },
}

impl HuntError {
    /// Creates a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps an error raised after `hunt_id` was persisted.
    pub fn post_commit(
        hunt_id: &HuntId,
        stage: PostCommitStage,
        source: impl Into<HuntError>,
    ) -> Self {
        Self::PostCommit {
            hunt_id: hunt_id.clone(),
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Returns true for rejected requests and disallowed transitions.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Transition(_))
    }

    /// Returns true if the hunt does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The persisted hunt a post-commit failure refers to.
    pub fn hunt_id(&self) -> Option<&HuntId> {
        match self {
            Self::PostCommit { hunt_id, .. } => Some(hunt_id),
            _ => None,
        }
    }

    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Transition(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store",
            Self::Compile(_) => "compile",
            Self::Notify(_) => "notify",
            Self::NotifierUnavailable => "notifier_unavailable",
            Self::Journal(_) => "journal",
            Self::Cancelled => "cancelled",
            Self::PostCommit { .. } => "post_commit",
        }
    }
}

impl From<DispatcherError> for HuntError {
    fn from(err: DispatcherError) -> Self {
        match err {
            DispatcherError::NotFound(id) => Self::NotFound(id.to_string()),
            DispatcherError::AlreadyExists(id) => {
                Self::Validation(format!("Hunt {} already exists", id))
            }
            DispatcherError::Store(e) => Self::Store(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_errors_map_to_service_variants() {
        let id: HuntId = "H.01".parse().unwrap();
        let err: HuntError = DispatcherError::NotFound(id).into();
        assert!(err.is_not_found());

        let err: HuntError = DispatcherError::Store(StoreError::io("disk")).into();
        assert_eq!(err.kind(), "store");

        let err: HuntError = DispatcherError::AlreadyExists("H.01".parse().unwrap()).into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid hunt request: Hunt H.01 already exists");
    }

    #[test]
    fn test_transition_counts_as_validation() {
        let err: HuntError = TransitionError::EmptyDescription.into();
        assert!(err.is_validation());
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_post_commit_carries_hunt_id() {
        let id: HuntId = "H.01".parse().unwrap();
        let err = HuntError::post_commit(&id, PostCommitStage::Refresh, StoreError::io("disk"));
        assert_eq!(err.hunt_id(), Some(&id));
        assert!(err.to_string().contains("refresh"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
