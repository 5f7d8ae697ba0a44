use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::{self, BuildConfig};
use crate::effects::{
    ArtifactCache, ContentFingerprinter, DependencyIndex, FileSystem, MetadataStore,
    SharedEffects, SystemEffects, TaskRunner,
};
use crate::settings::EnvSnapshot;

/// Everything one build invocation needs: the immutable environment
/// snapshot, the app's build configuration, and the effect handles the
/// controllers act through. Constructed once per build; controllers never
/// read ambient process state.
pub struct BuildContext {
    app_root: PathBuf,
    env: EnvSnapshot,
    config: BuildConfig,
    effects: SharedEffects,
}

impl BuildContext {
    /// Creates a context for the app at `app_root`, capturing the process
    /// environment and loading `build.toml`.
    ///
    /// # Errors
    /// Returns an error if the build configuration cannot be loaded.
    pub fn new(app_root: PathBuf, cache_root: &Path) -> Result<Self> {
        Self::with_env(app_root, cache_root, EnvSnapshot::capture())
    }

    /// Like [`BuildContext::new`] but with an explicit environment snapshot.
    ///
    /// # Errors
    /// Returns an error if the build configuration cannot be loaded.
    pub fn with_env(app_root: PathBuf, cache_root: &Path, env: EnvSnapshot) -> Result<Self> {
        let config = config::load_build_config(&app_root)?;
        let effects: SharedEffects =
            Arc::new(SystemEffects::new(&app_root, cache_root, &config, &env));
        Ok(Self {
            app_root,
            env,
            config,
            effects,
        })
    }

    /// Assembles a context from pre-built parts, bypassing configuration
    /// loading and system effect wiring.
    #[must_use]
    pub fn from_parts(
        app_root: PathBuf,
        env: EnvSnapshot,
        config: BuildConfig,
        effects: SharedEffects,
    ) -> Self {
        Self {
            app_root,
            env,
            config,
            effects,
        }
    }

    #[must_use]
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.var(key)
    }

    #[must_use]
    pub fn env_flag_enabled(&self, key: &str) -> bool {
        self.env.flag_is_enabled(key)
    }

    pub fn tasks(&self) -> &dyn TaskRunner {
        self.effects.tasks()
    }

    pub fn metadata(&self) -> &dyn MetadataStore {
        self.effects.metadata()
    }

    pub fn artifacts(&self) -> &dyn ArtifactCache {
        self.effects.artifacts()
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.effects.fs()
    }

    pub fn deps(&self) -> &dyn DependencyIndex {
        self.effects.deps()
    }

    pub fn fingerprinter(&self) -> &dyn ContentFingerprinter {
        self.effects.fingerprinter()
    }
}
