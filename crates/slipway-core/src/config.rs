use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::json;
use toml_edit::{DocumentMut, Item};

use crate::outcome::BuildUserError;
use crate::settings::{EnvSnapshot, CACHE_PATH_VAR};

/// Per-app build settings file, read from the app root.
pub const BUILD_CONFIG_FILE: &str = "build.toml";

/// Settings an application can declare in `build.toml`: extra task
/// environment variables, custom hook steps, and path overrides. Everything
/// has a default; a missing file is a valid (empty) configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub env: IndexMap<String, String>,
    pub steps: HookSteps,
    pub paths: PathConfig,
    pub assets: AssetConfig,
    pub tasks: TaskConfig,
}

#[derive(Debug, Clone, Default)]
pub struct HookSteps {
    pub before_assets: Vec<String>,
    pub after_assets: Vec<String>,
    pub before_migrations: Vec<String>,
    pub after_migrations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PathConfig {
    pub assets_dir: String,
    pub manifest: String,
    pub schema: String,
    pub metadata_dir: String,
    pub lockfile: String,
}

#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Ordered source paths covered by the asset fingerprint.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub runner: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            env: IndexMap::new(),
            steps: HookSteps::default(),
            paths: PathConfig {
                assets_dir: "public/assets".to_string(),
                manifest: "public/assets/manifest.yml".to_string(),
                schema: "db/schema.rb".to_string(),
                metadata_dir: "vendor/slipway".to_string(),
                lockfile: "Gemfile.lock".to_string(),
            },
            assets: AssetConfig {
                sources: vec!["vendor/assets".to_string(), "app/assets".to_string()],
            },
            tasks: TaskConfig {
                runner: "rake".to_string(),
            },
        }
    }
}

/// Loads `build.toml` from the app root, falling back to defaults when the
/// file does not exist.
///
/// # Errors
///
/// Returns a [`BuildUserError`] when the file exists but cannot be parsed.
pub fn load_build_config(app_root: &Path) -> Result<BuildConfig> {
    let path = app_root.join(BUILD_CONFIG_FILE);
    if !path.exists() {
        return Ok(BuildConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_build_config(&text).map_err(|err| {
        BuildUserError::new(
            format!("invalid {}: {err}", path.display()),
            json!({ "path": path.display().to_string() }),
        )
        .into()
    })
}

pub(crate) fn parse_build_config(text: &str) -> Result<BuildConfig> {
    let doc: DocumentMut = text.parse().context("parsing build config")?;
    let mut config = BuildConfig::default();

    if let Some(table) = doc.get("env").and_then(Item::as_table) {
        for (key, item) in table {
            if let Some(value) = item.as_str() {
                config.env.insert(key.to_string(), value.to_string());
            }
        }
    }

    if let Some(table) = doc.get("steps").and_then(Item::as_table) {
        config.steps.before_assets = string_list(table.get("before_assets"));
        config.steps.after_assets = string_list(table.get("after_assets"));
        config.steps.before_migrations = string_list(table.get("before_migrations"));
        config.steps.after_migrations = string_list(table.get("after_migrations"));
    }

    if let Some(table) = doc.get("paths").and_then(Item::as_table) {
        override_path(table.get("assets_dir"), &mut config.paths.assets_dir);
        override_path(table.get("manifest"), &mut config.paths.manifest);
        override_path(table.get("schema"), &mut config.paths.schema);
        override_path(table.get("metadata_dir"), &mut config.paths.metadata_dir);
        override_path(table.get("lockfile"), &mut config.paths.lockfile);
    }

    if let Some(sources) = doc
        .get("assets")
        .and_then(Item::as_table)
        .and_then(|table| table.get("sources"))
    {
        let listed = string_list(Some(sources));
        if !listed.is_empty() {
            config.assets.sources = listed;
        }
    }

    if let Some(runner) = doc
        .get("tasks")
        .and_then(Item::as_table)
        .and_then(|table| table.get("runner"))
        .and_then(Item::as_str)
    {
        config.tasks.runner = runner.to_string();
    }

    Ok(config)
}

fn string_list(item: Option<&Item>) -> Vec<String> {
    item.and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|value| value.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn override_path(item: Option<&Item>, slot: &mut String) {
    if let Some(value) = item.and_then(Item::as_str) {
        *slot = value.to_string();
    }
}

#[derive(Debug, Clone)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

/// Determine the root directory for the cross-build artifact cache.
#[must_use]
pub fn resolve_cache_root(
    env: &EnvSnapshot,
    override_path: Option<PathBuf>,
    app_root: &Path,
) -> CacheLocation {
    if let Some(path) = override_path {
        return CacheLocation {
            path,
            source: "--cache-dir",
        };
    }
    if let Some(raw) = env.var(CACHE_PATH_VAR) {
        return CacheLocation {
            path: PathBuf::from(raw),
            source: CACHE_PATH_VAR,
        };
    }
    CacheLocation {
        path: app_root.join(".slipway").join("cache"),
        source: "default (.slipway/cache)",
    }
}
