use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::{ArtifactCompiler, CompileError, CompiledCollectorArgs, CompiledQuery};
use crate::access::AccessContext;
use crate::artifacts::{source_path, ArtifactRepository};
use crate::hunt::StartRequest;

const OBFUSCATED_PREFIX: &str = "obf_";
const OBFUSCATED_HEX_LEN: usize = 16;

/// Replaces a name with `obf_` and the first 16 hex digits of its SHA-256.
pub fn obfuscate_name(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let hex = hex::encode(digest);
    format!("{}{}", OBFUSCATED_PREFIX, &hex[..OBFUSCATED_HEX_LEN])
}

/// Compiles requests locally from artifact definitions.
///
/// Each requested artifact becomes one [`CompiledCollectorArgs`] whose `env`
/// holds the declared parameter defaults overlaid with the request's values.
/// Request order is preserved.
#[derive(Debug, Clone, Default)]
pub struct TemplateCompiler;

impl TemplateCompiler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactCompiler for TemplateCompiler {
    #[instrument(
        skip_all,
        fields(principal = %access.principal, artifacts = request.artifacts.len())
    )]
    async fn compile(
        &self,
        access: &AccessContext,
        repository: &dyn ArtifactRepository,
        obfuscate: bool,
        request: &StartRequest,
    ) -> Result<Vec<CompiledCollectorArgs>, CompileError> {
        if request.artifacts.is_empty() {
            return Err(CompileError::EmptyRequest);
        }
        if let Some(spec) = request
            .specs
            .iter()
            .find(|spec| !request.artifacts.contains(&spec.artifact))
        {
            return Err(CompileError::UnexpectedSpec(spec.artifact.clone()));
        }

        let mut compiled = Vec::with_capacity(request.artifacts.len());
        for name in &request.artifacts {
            let definition = repository
                .get(name)
                .ok_or_else(|| CompileError::UnknownArtifact(name.clone()))?;

            if let Some(permission) = access.missing(&definition.required_permissions) {
                return Err(CompileError::PermissionDenied {
                    principal: access.principal.clone(),
                    permission,
                    artifact: name.clone(),
                });
            }

            let mut env: BTreeMap<String, String> = definition
                .parameters
                .iter()
                .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
                .collect();
            if let Some(parameters) = request.parameters_for(name) {
                for (key, value) in parameters {
                    if definition.parameter(key).is_none() {
                        return Err(CompileError::UnknownParameter {
                            artifact: name.clone(),
                            parameter: key.clone(),
                        });
                    }
                    env.insert(key.clone(), value.clone());
                }
            }

            let queries = definition
                .sources
                .iter()
                .map(|source| {
                    let path = source_path(name, &source.name);
                    CompiledQuery {
                        name: if obfuscate { obfuscate_name(&path) } else { path },
                        query: source.query.clone(),
                    }
                })
                .collect();

            compiled.push(CompiledCollectorArgs {
                artifact: if obfuscate {
                    obfuscate_name(name)
                } else {
                    name.clone()
                },
                env,
                queries,
                timeout_secs: request.timeout_secs,
                max_rows: request.max_rows,
            });
        }

        debug!(compiled = compiled.len(), obfuscate, "Compiled hunt request");
        Ok(compiled)
    }
}
