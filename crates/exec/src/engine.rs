//! Execution orchestrator
//!
//! `Engine::execute` is the single public operation: resolve the toolchain,
//! create a workspace, reuse or build the artifact, run it and report.

use crate::compiler::{self, CompileOutcome};
use crate::registry::ToolchainRegistry;
use crate::runner;
use crate::workspace::Workspace;
use codeon_cache::{BuildCache, CacheKey};
use codeon_config::EngineConfig;
use codeon_core::{
    Error, ExecutionRequest, ExecutionResult, Result, ToolchainSpec, COMPILE_TIMEOUT,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Per-engine limits and locations
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Parent directory of every execution workspace
    pub workspace_root: PathBuf,
    pub execution_timeout: Duration,
    pub compile_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            workspace_root: config.workspace_root(),
            execution_timeout: config.execution_timeout(),
            compile_timeout: COMPILE_TIMEOUT,
        }
    }
}

/// Shared handle to the execution engine
///
/// Clones are cheap and share the registry and the build cache, so one
/// engine can serve many concurrent requests.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    registry: ToolchainRegistry,
    cache: BuildCache,
    settings: EngineSettings,
}

impl Engine {
    /// Build an engine from a validated configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let registry = ToolchainRegistry::from_config(config);
        let cache = BuildCache::new(config.cache_dir(), config.cache_max_bytes)?;

        tracing::debug!(
            languages = registry.len(),
            cache_dir = %cache.base_dir().display(),
            "engine ready"
        );

        Ok(Self::from_parts(
            registry,
            cache,
            EngineSettings::from_config(config),
        ))
    }

    pub fn from_parts(
        registry: ToolchainRegistry,
        cache: BuildCache,
        settings: EngineSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                cache,
                settings,
            }),
        }
    }

    pub fn registry(&self) -> &ToolchainRegistry {
        &self.inner.registry
    }

    pub fn cache(&self) -> &BuildCache {
        &self.inner.cache
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Supported language ids, sorted
    pub fn languages(&self) -> Vec<&str> {
        self.inner.registry.languages()
    }

    /// Compile (or reuse) and run one program
    ///
    /// Every program-level outcome, including an unsupported language, is an
    /// `Ok` result. `Err` means the engine itself failed, e.g. the workspace
    /// could not be created.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let spec = match self.inner.registry.resolve(&request.language) {
            Ok(spec) => spec,
            Err(_) => {
                tracing::info!(language = %request.language, "unsupported language requested");
                return Ok(ExecutionResult::unsupported_language(&request.language));
            }
        };

        let key = CacheKey::compute(&request.language, &request.source);
        let span = codeon_utils::tracing::execution_span(&request.language, key.short());
        self.execute_with(spec, key, request).instrument(span).await
    }

    async fn execute_with(
        &self,
        spec: &ToolchainSpec,
        key: CacheKey,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult> {
        let workspace = Workspace::create(&self.inner.settings.workspace_root)?;

        let source_path = workspace.source_path(spec);
        tokio::fs::write(&source_path, &request.source)
            .await
            .map_err(|e| Error::file_system(&source_path, "write source file", e))?;

        let mut cache_hit = false;
        let mut artifact = None;

        if spec.is_cacheable() {
            if let Some(destination) = workspace.artifact_path(spec) {
                if self.restore_cached(&key, &destination).await {
                    cache_hit = true;
                    artifact = Some(destination);
                }
            }
        }

        if !cache_hit {
            let compile_timeout = self.inner.settings.compile_timeout;
            match compiler::compile(spec, &workspace, compile_timeout).await {
                CompileOutcome::Failed(result) => {
                    tracing::info!(outcome = ?result.outcome, "compilation did not succeed");
                    return Ok(result);
                }
                CompileOutcome::Ready { artifact: built } => {
                    if spec.is_cacheable() {
                        if let Some(path) = &built {
                            self.store_artifact(&key, path).await;
                        }
                    }
                    artifact = built;
                }
            }
        }

        let mut result = runner::run(
            spec,
            &workspace,
            artifact.as_deref(),
            &request.stdin,
            self.inner.settings.execution_timeout,
        )
        .await;
        result.cache_hit = cache_hit;

        tracing::info!(
            outcome = ?result.outcome,
            cache_hit,
            duration_ms = (result.duration_seconds * 1000.0) as u64,
            peak_memory_kb = result.peak_memory_kb,
            "execution finished"
        );

        Ok(result)
    }

    /// Copy a cached artifact into place; any failure means "compile instead"
    async fn restore_cached(&self, key: &CacheKey, destination: &Path) -> bool {
        let cache = self.inner.cache.clone();
        let key = key.clone();
        let destination = destination.to_path_buf();

        let restored = tokio::task::spawn_blocking(move || {
            let Some(artifact) = cache.lookup(&key)? else {
                return Ok(false);
            };
            cache.copy_into(&artifact, &destination)?;
            Ok::<_, codeon_cache::CacheError>(true)
        })
        .await;

        match restored {
            Ok(Ok(hit)) => {
                tracing::debug!(hit, "build cache lookup");
                hit
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "cached artifact unusable, compiling instead");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache lookup task failed");
                false
            }
        }
    }

    /// Store a fresh artifact; failures are logged and never fail the request
    async fn store_artifact(&self, key: &CacheKey, artifact: &Path) {
        let cache = self.inner.cache.clone();
        let key = key.clone();
        let artifact = artifact.to_path_buf();

        let stored = tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&artifact)
                .map_err(|e| codeon_cache::CacheError::io(&artifact, "read compiled artifact", e))?;
            cache.store(&key, &bytes)
        })
        .await;

        match stored {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to store artifact in build cache"),
            Err(e) => tracing::warn!(error = %e, "cache store task failed"),
        }
    }
}
