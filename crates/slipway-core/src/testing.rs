use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::effects::{
    ArtifactCache, ContentFingerprinter, DependencyIndex, Effects, MetadataStore, SharedEffects,
    SystemFileSystem, TaskReport, TaskRunner,
};
use crate::settings::EnvSnapshot;

/// Task runner double recording every invocation.
pub(crate) struct StubTasks {
    defined: bool,
    succeed: bool,
    invocations: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl StubTasks {
    pub(crate) fn new(defined: bool, succeed: bool) -> Self {
        Self {
            defined,
            succeed,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn invocation_count(&self) -> usize {
        self.invocations.lock().expect("lock poisoned").len()
    }

    pub(crate) fn last_invocation(&self) -> Option<(String, Vec<(String, String)>)> {
        self.invocations
            .lock()
            .expect("lock poisoned")
            .last()
            .cloned()
    }

    pub(crate) fn last_env(&self) -> Option<Vec<(String, String)>> {
        self.last_invocation().map(|(_, env)| env)
    }
}

impl TaskRunner for StubTasks {
    fn is_defined(&self, _task: &str) -> Result<bool> {
        Ok(self.defined)
    }

    fn invoke(&self, task: &str, env: &[(String, String)]) -> Result<TaskReport> {
        self.invocations
            .lock()
            .expect("lock poisoned")
            .push((task.to_string(), env.to_vec()));
        Ok(TaskReport {
            success: self.succeed,
            elapsed: Duration::from_millis(5),
        })
    }
}

/// In-memory metadata store double.
#[derive(Default)]
pub(crate) struct MemoryMetadata {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryMetadata {
    pub(crate) fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.values.lock().expect("lock poisoned").get(key).cloned()
    }
}

impl MetadataStore for MemoryMetadata {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.seed(key, value);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.values.lock().expect("lock poisoned").contains_key(key)
    }
}

/// Artifact cache double tracking stores and loads by entry name.
#[derive(Default)]
pub(crate) struct RecordingCache {
    entries: Mutex<HashSet<String>>,
    stores: Mutex<Vec<String>>,
    loads: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub(crate) fn seed_entry(&self, name: &str) {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert(name.to_string());
    }

    pub(crate) fn store_count(&self, name: &str) -> usize {
        self.stores
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|stored| stored.as_str() == name)
            .count()
    }

    pub(crate) fn load_count(&self, name: &str) -> usize {
        self.loads
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|loaded| loaded.as_str() == name)
            .count()
    }
}

impl ArtifactCache for RecordingCache {
    fn store(&self, name: &str) -> Result<()> {
        self.stores
            .lock()
            .expect("lock poisoned")
            .push(name.to_string());
        self.seed_entry(name);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<bool> {
        self.loads
            .lock()
            .expect("lock poisoned")
            .push(name.to_string());
        Ok(self.entries.lock().expect("lock poisoned").contains(name))
    }
}

pub(crate) struct FixedFingerprint(String);

impl ContentFingerprinter for FixedFingerprint {
    fn fingerprint(&self, _app_root: &Path, _sources: &[String]) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub(crate) struct StaticDeps(Vec<&'static str>);

impl DependencyIndex for StaticDeps {
    fn has_dependency(&self, name: &str) -> bool {
        self.0.contains(&name)
    }
}

/// Effect bundle wired entirely from doubles (plus the real filesystem,
/// which tests point at temp dirs).
pub(crate) struct TestEffects {
    pub(crate) tasks: Arc<StubTasks>,
    pub(crate) metadata: Arc<MemoryMetadata>,
    pub(crate) cache: Arc<RecordingCache>,
    fs: Arc<SystemFileSystem>,
    deps: Arc<StaticDeps>,
    fingerprinter: Arc<FixedFingerprint>,
}

impl TestEffects {
    pub(crate) fn new(task_defined: bool, task_succeeds: bool, fingerprint: &str) -> Arc<Self> {
        Arc::new(Self {
            tasks: Arc::new(StubTasks::new(task_defined, task_succeeds)),
            metadata: Arc::new(MemoryMetadata::default()),
            cache: Arc::new(RecordingCache::default()),
            fs: Arc::new(SystemFileSystem),
            deps: Arc::new(StaticDeps(Vec::new())),
            fingerprinter: Arc::new(FixedFingerprint(fingerprint.to_string())),
        })
    }
}

impl Effects for TestEffects {
    fn tasks(&self) -> &dyn TaskRunner {
        self.tasks.as_ref()
    }

    fn metadata(&self) -> &dyn MetadataStore {
        self.metadata.as_ref()
    }

    fn artifacts(&self) -> &dyn ArtifactCache {
        self.cache.as_ref()
    }

    fn fs(&self) -> &dyn crate::effects::FileSystem {
        self.fs.as_ref()
    }

    fn deps(&self) -> &dyn DependencyIndex {
        self.deps.as_ref()
    }

    fn fingerprinter(&self) -> &dyn ContentFingerprinter {
        self.fingerprinter.as_ref()
    }
}

pub(crate) fn test_context(
    app_root: &Path,
    effects: &Arc<TestEffects>,
    env: &[(&str, &str)],
) -> BuildContext {
    test_context_with_config(app_root, effects, env, BuildConfig::default())
}

pub(crate) fn test_context_with_config(
    app_root: &Path,
    effects: &Arc<TestEffects>,
    env: &[(&str, &str)],
    config: BuildConfig,
) -> BuildContext {
    let shared: SharedEffects = effects.clone();
    BuildContext::from_parts(
        app_root.to_path_buf(),
        EnvSnapshot::testing(env),
        config,
        shared,
    )
}
