//! Compiling hunt requests into client-executable collector arguments.
//!
//! The compiled form is fixed when a hunt is created and never recompiled,
//! so later edits to an artifact definition do not change what a running
//! hunt collects.

mod template;

pub use template::{obfuscate_name, TemplateCompiler};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::access::{AccessContext, Permission};
use crate::artifacts::ArtifactRepository;
use crate::hunt::StartRequest;

/// One query ready to run on a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub name: String,
    pub query: String,
}

/// Everything a client needs to collect one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledCollectorArgs {
    /// Artifact name, possibly obfuscated.
    pub artifact: String,
    /// Parameter environment the queries run with.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub queries: Vec<CompiledQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
}

/// Errors that can occur while compiling a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unknown artifact: {0}")]
    UnknownArtifact(String),

    #[error("Unknown parameter '{parameter}' for artifact {artifact}")]
    UnknownParameter { artifact: String, parameter: String },

    #[error("Parameters given for artifact {0} which is not collected")]
    UnexpectedSpec(String),

    #[error("{principal} lacks permission {permission} required by {artifact}")]
    PermissionDenied {
        principal: String,
        permission: Permission,
        artifact: String,
    },

    #[error("No artifacts to collect.")]
    EmptyRequest,

    #[error("Compiler backend error: {0}")]
    Backend(String),
}

impl CompileError {
    /// Returns the error kind as a static string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownArtifact(_) => "unknown_artifact",
            Self::UnknownParameter { .. } => "unknown_parameter",
            Self::UnexpectedSpec(_) => "unexpected_spec",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::EmptyRequest => "empty_request",
            Self::Backend(_) => "backend",
        }
    }
}

/// Turns a [`StartRequest`] into compiled collector arguments.
///
/// The call may be slow; callers race it against their cancellation token.
#[async_trait]
pub trait ArtifactCompiler: Send + Sync + 'static {
    async fn compile(
        &self,
        access: &AccessContext,
        repository: &dyn ArtifactRepository,
        obfuscate: bool,
        request: &StartRequest,
    ) -> Result<Vec<CompiledCollectorArgs>, CompileError>;
}
