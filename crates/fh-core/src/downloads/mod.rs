//! Prepared-download manifests.
//!
//! Packaging results into downloads happens elsewhere. This module only lists
//! what has already been prepared so that
//! [`HuntService::get_hunt`](crate::service::HuntService::get_hunt) can attach
//! it to the returned stats.

mod fs;
mod memory;

pub use fs::FsDownloadIndex;
pub use memory::MemoryDownloadIndex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One prepared download file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFile {
    /// File name without directory.
    pub name: String,
    /// Logical path, e.g. `/downloads/hunts/H.1234/H.1234.zip`.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the backend knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// False while the file is still being written.
    #[serde(default)]
    pub complete: bool,
}

/// The manifest attached to hunt stats on reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableDownloads {
    #[serde(default)]
    pub files: Vec<DownloadFile>,
}

impl AvailableDownloads {
    /// Returns true if nothing has been prepared.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Errors that can occur when listing downloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("Invalid download path: {0}")]
    InvalidPath(String),

    #[error("Download index I/O error: {0}")]
    Io(String),
}

impl DownloadError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::Io(_) => "io",
        }
    }
}

/// Lists the downloads prepared under a logical directory.
#[async_trait]
pub trait DownloadIndex: Send + Sync + 'static {
    /// Returns the files under `path`. A directory that does not exist yet
    /// yields an empty manifest.
    async fn list_available(&self, path: &str) -> Result<AvailableDownloads, DownloadError>;
}
