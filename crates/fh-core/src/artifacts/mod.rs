//! Artifact definitions and the repositories that serve them.
//!
//! An artifact is a named, parameterised collection of queries. Hunts refer
//! to artifacts by name; the compiler and the service look the definitions up
//! through an [`ArtifactRepository`].

mod yaml;

pub use yaml::{load_definitions, YamlArtifactRepository};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::access::Permission;

/// A declared artifact parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// One query of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Source name. Empty for single-source artifacts.
    #[serde(default)]
    pub name: String,
    pub query: String,
}

/// A complete artifact definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub sources: Vec<SourceDefinition>,
    #[serde(default)]
    pub required_permissions: Vec<Permission>,
}

impl ArtifactDefinition {
    /// Returns the declared parameter called `name`.
    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Returns the `artifact/source` path of every source. A source without
    /// a name is addressed by the artifact name alone.
    pub fn source_paths(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| source_path(&self.name, &source.name))
            .collect()
    }
}

/// Joins an artifact and source name into the `artifact/source` form.
pub fn source_path(artifact: &str, source: &str) -> String {
    if source.is_empty() {
        artifact.to_string()
    } else {
        format!("{}/{}", artifact, source)
    }
}

/// Errors that can occur while loading artifact definitions.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse artifact definition {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Duplicate artifact definition: {0}")]
    Duplicate(String),

    #[error("Invalid artifact definition {name}: {message}")]
    Invalid { name: String, message: String },
}

impl ArtifactError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse { .. } => "parse",
            Self::Duplicate(_) => "duplicate",
            Self::Invalid { .. } => "invalid",
        }
    }
}

/// Read-only access to artifact definitions.
pub trait ArtifactRepository: Send + Sync + 'static {
    /// Returns the definition called `name`.
    fn get(&self, name: &str) -> Option<ArtifactDefinition>;

    /// Returns every known artifact name, sorted.
    fn names(&self) -> Vec<String>;

    /// Resolves an artifact into its `artifact/source` paths.
    fn resolve(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).map(|definition| definition.source_paths())
    }
}

/// Artifact definitions held in a map.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactRepository {
    definitions: BTreeMap<String, ArtifactDefinition>,
}

impl MemoryArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, replacing one of the same name.
    pub fn with_definition(mut self, definition: ArtifactDefinition) -> Self {
        self.insert(definition);
        self
    }

    /// Adds a definition, returning the one it replaced.
    pub fn insert(&mut self, definition: ArtifactDefinition) -> Option<ArtifactDefinition> {
        self.definitions.insert(definition.name.clone(), definition)
    }

    /// Parses one or more YAML documents into a repository.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ArtifactError> {
        let mut repository = Self::new();
        for definition in yaml::parse_documents(yaml, "<inline>")? {
            let name = definition.name.clone();
            if repository.insert(definition).is_some() {
                return Err(ArtifactError::Duplicate(name));
            }
        }
        Ok(repository)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ArtifactRepository for MemoryArtifactRepository {
    fn get(&self, name: &str) -> Option<ArtifactDefinition> {
        self.definitions.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PSLIST: &str = r#"
name: Windows.System.Pslist
description: List processes
parameters:
  - name: ProcessRegex
    default: "."
sources:
  - query: SELECT * FROM pslist() WHERE Name =~ ProcessRegex
required_permissions:
  - COLLECT_CLIENT
---
name: Generic.Client.Info
sources:
  - name: BasicInformation
    query: SELECT * FROM info()
  - name: Users
    query: SELECT * FROM users()
"#;

    #[test]
    fn test_from_yaml_str_multi_document() {
        let repository = MemoryArtifactRepository::from_yaml_str(PSLIST).unwrap();
        assert_eq!(repository.len(), 2);
        assert_eq!(
            repository.names(),
            vec!["Generic.Client.Info".to_string(), "Windows.System.Pslist".to_string()]
        );

        let pslist = repository.get("Windows.System.Pslist").unwrap();
        assert_eq!(pslist.required_permissions, vec![Permission::CollectClient]);
        assert_eq!(
            pslist.parameter("ProcessRegex").and_then(|p| p.default.clone()),
            Some(".".to_string())
        );
    }

    #[test]
    fn test_resolve_joins_source_names() {
        let repository = MemoryArtifactRepository::from_yaml_str(PSLIST).unwrap();
        assert_eq!(
            repository.resolve("Generic.Client.Info").unwrap(),
            vec![
                "Generic.Client.Info/BasicInformation".to_string(),
                "Generic.Client.Info/Users".to_string()
            ]
        );
        assert_eq!(
            repository.resolve("Windows.System.Pslist").unwrap(),
            vec!["Windows.System.Pslist".to_string()]
        );
        assert!(repository.resolve("Unknown.Artifact").is_none());
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let yaml = "name: A\nsources: [{query: x}]\n---\nname: A\nsources: [{query: y}]\n";
        let err = MemoryArtifactRepository::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.kind(), "duplicate");
    }
}
