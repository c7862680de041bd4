//! Loading artifact definitions from YAML files.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ArtifactDefinition, ArtifactError, ArtifactRepository, MemoryArtifactRepository};

/// Parses every YAML document in `content`. Empty documents are skipped.
pub(crate) fn parse_documents(
    content: &str,
    file: &str,
) -> Result<Vec<ArtifactDefinition>, ArtifactError> {
    let mut definitions = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| ArtifactError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        if value.is_null() {
            continue;
        }
        let definition: ArtifactDefinition =
            serde_yaml::from_value(value).map_err(|e| ArtifactError::Parse {
                file: file.to_string(),
                message: e.to_string(),
            })?;
        validate(&definition)?;
        definitions.push(definition);
    }
    Ok(definitions)
}

fn validate(definition: &ArtifactDefinition) -> Result<(), ArtifactError> {
    let invalid = |message: &str| ArtifactError::Invalid {
        name: definition.name.clone(),
        message: message.to_string(),
    };
    if definition.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if definition.sources.is_empty() {
        return Err(invalid("at least one source is required"));
    }
    let mut seen = std::collections::HashSet::new();
    for source in &definition.sources {
        if !seen.insert(source.name.as_str()) {
            return Err(invalid(&format!("duplicate source '{}'", source.name)));
        }
    }
    Ok(())
}

/// Reads every `*.yaml` and `*.yml` file directly under `dir`.
pub fn load_definitions(dir: &Path) -> Result<Vec<ArtifactDefinition>, ArtifactError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort();

    let mut definitions = Vec::new();
    for file in files {
        let content = std::fs::read_to_string(&file)?;
        let parsed = parse_documents(&content, &file.display().to_string())?;
        debug!(file = %file.display(), count = parsed.len(), "Loaded artifact definitions");
        definitions.extend(parsed);
    }
    Ok(definitions)
}

/// Artifact repository loaded from a directory of YAML definitions.
#[derive(Debug, Clone)]
pub struct YamlArtifactRepository {
    dir: PathBuf,
    inner: MemoryArtifactRepository,
}

impl YamlArtifactRepository {
    /// Loads every definition under `dir`. Duplicate names are an error.
    pub fn load_dir(dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let dir = dir.into();
        let mut inner = MemoryArtifactRepository::new();
        for definition in load_definitions(&dir)? {
            let name = definition.name.clone();
            if inner.insert(definition).is_some() {
                return Err(ArtifactError::Duplicate(name));
            }
        }
        info!(dir = %dir.display(), artifacts = inner.len(), "Artifact repository loaded");
        Ok(Self { dir, inner })
    }

    /// Directory the definitions were loaded from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ArtifactRepository for YamlArtifactRepository {
    fn get(&self, name: &str) -> Option<ArtifactDefinition> {
        self.inner.get(name)
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_dir_reads_yaml_and_yml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pslist.yaml"),
            "name: Windows.System.Pslist\nsources:\n  - query: SELECT * FROM pslist()\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("info.yml"),
            concat!(
                "name: Generic.Client.Info\n",
                "sources:\n",
                "  - name: Users\n",
                "    query: SELECT * FROM users()\n",
            ),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not an artifact").unwrap();

        let repository = YamlArtifactRepository::load_dir(dir.path()).unwrap();
        assert_eq!(repository.len(), 2);
        assert_eq!(
            repository.resolve("Generic.Client.Info").unwrap(),
            vec!["Generic.Client.Info/Users".to_string()]
        );
    }

    #[test]
    fn test_load_dir_reports_file_on_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [unterminated").unwrap();
        let err = YamlArtifactRepository::load_dir(dir.path()).unwrap_err();
        match err {
            ArtifactError::Parse { file, .. } => assert!(file.ends_with("broken.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_definition_without_sources_is_invalid() {
        let err = parse_documents("name: Empty.Artifact\n", "inline").unwrap_err();
        assert_eq!(err.kind(), "invalid");
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = YamlArtifactRepository::load_dir(dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
