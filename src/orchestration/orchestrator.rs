//! Build orchestration
//!
//! One run moves through four phases, never re-entering one:
//!
//! 1. Fingerprint: toolchain version plus source tree fingerprint
//! 2. Decide: compare against the stored [`CacheRecord`]
//! 3. Build (miss only): run the build tool, resolve the artifact, store it
//! 4. Replace: swap the source root's contents for the cached artifact
//!
//! A failed build never touches the cache, and the root is only modified
//! once an artifact is safely stored.

use crate::artifact::ArtifactResolver;
use crate::cache::{BuildCache, CacheRecord};
use crate::config::{Config, ConfigManager};
use crate::error::{JavelinError, JavelinResult};
use crate::fingerprint::{default_concurrency, TreeFingerprinter};
use crate::orchestration::executor::Executor;
use crate::orchestration::plan::BuildPlan;
use crate::orchestration::replace::replace_contents;
use crate::orchestration::toolchain::ToolchainSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Explicit engine settings, resolved before construction
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory holding the cached artifact and its metadata
    pub cache_dir: PathBuf,

    /// Maximum files hashed at once
    pub concurrency: usize,

    /// Toolchain version source
    pub toolchain: ToolchainSource,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        let toolchain = match &config.build.toolchain_version {
            Some(version) => ToolchainSource::Fixed(version.clone()),
            None => ToolchainSource::Probe(config.build.toolchain_probe.clone()),
        };

        Self {
            cache_dir: config
                .cache
                .dir
                .clone()
                .unwrap_or_else(ConfigManager::default_cache_dir),
            concurrency: config
                .fingerprint
                .concurrency
                .unwrap_or_else(default_concurrency),
            toolchain,
        }
    }
}

/// Input to one orchestration run
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Application root; holds sources before the run, build output after
    pub source_root: PathBuf,

    pub plan: BuildPlan,
}

/// Result of a successful orchestration run
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Whether the build was skipped
    pub cache_hit: bool,

    /// Cached artifact the root was populated from
    pub artifact: PathBuf,

    /// Artifact the build produced (miss only)
    pub resolved: Option<PathBuf>,

    /// Record the run was keyed on
    pub record: CacheRecord,
}

/// Fingerprint, decide, build and replace
pub struct BuildOrchestrator<E: Executor> {
    executor: E,
    fingerprinter: TreeFingerprinter,
    resolver: ArtifactResolver,
    cache: BuildCache,
    toolchain: ToolchainSource,
}

impl<E: Executor> BuildOrchestrator<E> {
    pub fn new(executor: E, config: OrchestratorConfig) -> Self {
        Self {
            executor,
            fingerprinter: TreeFingerprinter::new(config.concurrency),
            resolver: ArtifactResolver::new(),
            cache: BuildCache::new(config.cache_dir),
            toolchain: config.toolchain,
        }
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Compute the record describing `root` as it is now
    pub async fn current_record(&self, root: &Path) -> JavelinResult<CacheRecord> {
        let version = self.toolchain.version(&self.executor, root).await?;
        let sources = self.fingerprinter.fingerprint(root).await?;
        Ok(CacheRecord::new(version, sources))
    }

    /// Run all phases against `request.source_root`
    pub async fn run(&mut self, request: &BuildRequest) -> JavelinResult<BuildOutcome> {
        let root = absolute(&request.source_root)?;
        let cache_dir = absolute(self.cache.dir())?;
        if cache_dir.starts_with(&root) {
            return Err(JavelinError::ConfigInvalid {
                path: cache_dir,
                reason: format!(
                    "cache directory must not be inside the source root {}",
                    root.display()
                ),
            });
        }

        info!("Fingerprinting {}", root.display());
        let record = self.current_record(&root).await?;
        debug!(
            "Fingerprinted {} entries, toolchain {}",
            record.sources.len(),
            record.toolchain_version
        );

        self.cache.load().await;
        let cache_hit = self.cache.is_hit(&record);

        let resolved = if cache_hit {
            info!("Cache hit, skipping build");
            None
        } else {
            info!("Cache miss, building");
            let artifact = self.build(&root, &request.plan).await?;
            self.cache.store(record.clone(), &artifact).await?;
            Some(artifact)
        };

        let artifact = self.cache.cached_artifact_path();
        replace_contents(&root, &artifact).await?;

        Ok(BuildOutcome {
            cache_hit,
            artifact,
            resolved,
            record,
        })
    }

    async fn build(&self, root: &Path, plan: &BuildPlan) -> JavelinResult<PathBuf> {
        self.executor
            .run(&plan.executable, root, &plan.arguments)
            .await?;

        let resolver = self.resolver;
        let search_root = root.to_path_buf();
        let pattern = plan.artifact_glob.clone();
        let artifact =
            tokio::task::spawn_blocking(move || resolver.resolve(&search_root, &pattern))
                .await
                .map_err(|e| {
                    JavelinError::Internal(format!("artifact resolution task failed: {}", e))
                })??;

        info!("Resolved artifact {}", artifact.display());
        Ok(artifact)
    }
}

fn absolute(path: &Path) -> JavelinResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| JavelinError::io(format!("resolving {}", path.display()), e))
}
