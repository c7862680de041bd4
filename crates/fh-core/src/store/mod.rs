//! Durable hunt persistence.
//!
//! The [`HuntStore`] trait is the only way hunts reach durable storage. Each
//! hunt is one record addressed by its canonical path (see
//! [`HuntPaths`](crate::hunt::HuntPaths)), and the dispatcher rebuilds its
//! mirror by listing the hunts namespace.
//!
//! # Implementations
//!
//! - [`MemoryHuntStore`]: in-process map of serialized records, for tests and
//!   single-process setups
//! - [`FileHuntStore`]: one JSON document per hunt under a data directory

mod file;
mod memory;

pub use file::FileHuntStore;
pub use memory::MemoryHuntStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::hunt::Hunt;

/// Errors that can occur in hunt store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record exists at the path.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The path is not a valid record path.
    #[error("Invalid record path: {0}")]
    InvalidPath(String),

    /// Failed to encode or decode a record.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing storage failed.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// The store is not accepting requests.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a new I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates a new unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns `true` if the error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidPath(_) => "invalid_path",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Durable, path-addressed storage for hunt records.
///
/// Implementations must be thread-safe and return independent copies: a
/// record returned by `get` or `list` never aliases what a later `put`
/// writes.
#[async_trait]
pub trait HuntStore: Send + Sync + 'static {
    /// Writes the record at `path`, replacing any previous version.
    async fn put(&self, path: &str, hunt: &Hunt) -> Result<(), StoreError>;

    /// Reads the record at `path`.
    ///
    /// Returns [`StoreError::NotFound`] if nothing was ever written there.
    async fn get(&self, path: &str) -> Result<Hunt, StoreError>;

    /// Returns every record directly under `namespace`.
    async fn list(&self, namespace: &str) -> Result<Vec<Hunt>, StoreError>;
}
