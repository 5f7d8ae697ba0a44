use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::artifacts::SystemArtifactCache;
use crate::config::BuildConfig;
use crate::database::LockfileIndex;
use crate::fingerprint::TreeFingerprinter;
use crate::metadata::SystemMetadataStore;
use crate::settings::{EnvSnapshot, TASK_RUNNER_VAR};
use crate::tasks::SystemTaskRunner;

/// Executes named build tasks inside the application.
pub trait TaskRunner: Send + Sync {
    /// Whether the project defines the task at all; absence is not an error.
    fn is_defined(&self, task: &str) -> Result<bool>;
    /// Runs the task with the given extra environment, blocking until it
    /// reports completion.
    fn invoke(&self, task: &str, env: &[(String, String)]) -> Result<TaskReport>;
}

#[derive(Debug, Clone, Copy)]
pub struct TaskReport {
    pub success: bool,
    pub elapsed: Duration,
}

impl TaskReport {
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Durable key→string map surviving across build invocations; the system's
/// only cross-build memory.
pub trait MetadataStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn exists(&self, key: &str) -> bool;
}

/// Wholesale directory-tree cache keyed by the tree's app-relative name.
pub trait ArtifactCache: Send + Sync {
    /// Saves the named tree, replacing any prior entry.
    fn store(&self, name: &str) -> Result<()>;
    /// Restores the named tree; returns `false` when no entry exists.
    fn load(&self, name: &str) -> Result<bool>;
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Presence checks against the application's declared dependencies.
pub trait DependencyIndex: Send + Sync {
    fn has_dependency(&self, name: &str) -> bool;
}

/// Computes a stable digest over the configured asset source paths.
pub trait ContentFingerprinter: Send + Sync {
    fn fingerprint(&self, app_root: &Path, sources: &[String]) -> Result<String>;
}

pub trait Effects: Send + Sync {
    fn tasks(&self) -> &dyn TaskRunner;
    fn metadata(&self) -> &dyn MetadataStore;
    fn artifacts(&self) -> &dyn ArtifactCache;
    fn fs(&self) -> &dyn FileSystem;
    fn deps(&self) -> &dyn DependencyIndex;
    fn fingerprinter(&self) -> &dyn ContentFingerprinter;
}

pub struct SystemEffects {
    tasks: Arc<SystemTaskRunner>,
    metadata: Arc<SystemMetadataStore>,
    artifacts: Arc<SystemArtifactCache>,
    fs: Arc<SystemFileSystem>,
    deps: Arc<LockfileIndex>,
    fingerprinter: Arc<TreeFingerprinter>,
}

impl SystemEffects {
    #[must_use]
    pub fn new(
        app_root: &Path,
        cache_root: &Path,
        config: &BuildConfig,
        env: &EnvSnapshot,
    ) -> Self {
        let runner = env
            .var(TASK_RUNNER_VAR)
            .unwrap_or(&config.tasks.runner)
            .to_string();
        Self {
            tasks: Arc::new(SystemTaskRunner::new(runner, app_root.to_path_buf())),
            metadata: Arc::new(SystemMetadataStore::new(
                app_root.join(&config.paths.metadata_dir),
            )),
            artifacts: Arc::new(SystemArtifactCache::new(
                app_root.to_path_buf(),
                cache_root.to_path_buf(),
            )),
            fs: Arc::new(SystemFileSystem),
            deps: Arc::new(LockfileIndex::new(app_root.join(&config.paths.lockfile))),
            fingerprinter: Arc::new(TreeFingerprinter),
        }
    }
}

impl Effects for SystemEffects {
    fn tasks(&self) -> &dyn TaskRunner {
        self.tasks.as_ref()
    }

    fn metadata(&self) -> &dyn MetadataStore {
        self.metadata.as_ref()
    }

    fn artifacts(&self) -> &dyn ArtifactCache {
        self.artifacts.as_ref()
    }

    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    fn deps(&self) -> &dyn DependencyIndex {
        self.deps.as_ref()
    }

    fn fingerprinter(&self) -> &dyn ContentFingerprinter {
        self.fingerprinter.as_ref()
    }
}

pub struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub type SharedEffects = Arc<dyn Effects>;
