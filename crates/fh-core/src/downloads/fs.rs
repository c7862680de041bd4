use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

use super::{AvailableDownloads, DownloadError, DownloadFile, DownloadIndex};

const LOCK_SUFFIX: &str = ".lock";

/// Lists prepared downloads from a directory tree.
///
/// A logical path `/downloads/hunts/H.1` maps to `<root>/downloads/hunts/H.1`.
/// A file with a `<name>.lock` sibling is still being written and is reported
/// as incomplete.
#[derive(Debug, Clone)]
pub struct FsDownloadIndex {
    root: PathBuf,
}

impl FsDownloadIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, DownloadError> {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(DownloadError::InvalidPath(path.to_string()));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl DownloadIndex for FsDownloadIndex {
    async fn list_available(&self, path: &str) -> Result<AvailableDownloads, DownloadError> {
        let dir = self.resolve(path)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AvailableDownloads::default()),
            Err(e) => return Err(DownloadError::Io(format!("{}: {}", dir.display(), e))),
        };

        let mut candidates = Vec::new();
        let mut locks = HashSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(locked) = name.strip_suffix(LOCK_SUFFIX) {
                locks.insert(locked.to_string());
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let modified = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).trunc_subsecs(6));
            candidates.push((name, metadata.len(), modified));
        }

        let base = path.trim_end_matches('/');
        let mut files: Vec<DownloadFile> = candidates
            .into_iter()
            .map(|(name, size, modified)| DownloadFile {
                path: format!("{}/{}", base, name),
                complete: !locks.contains(&name),
                name,
                size,
                modified,
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(AvailableDownloads { files })
    }
}
