use std::collections::HashMap;
use std::env;

/// Forces asset recompilation even when the fingerprint is unchanged.
pub const FORCE_ASSETS_VAR: &str = "SLIPWAY_FORCE_ASSETS";
/// Forces the forward migration task to run even when versions match.
pub const FORCE_MIGRATIONS_VAR: &str = "SLIPWAY_FORCE_MIGRATIONS";
/// Overrides the task runner program (default `rake`).
pub const TASK_RUNNER_VAR: &str = "SLIPWAY_TASK_RUNNER";
/// Overrides the artifact cache root directory.
pub const CACHE_PATH_VAR: &str = "SLIPWAY_CACHE_PATH";

/// Variables injected into compile and migration task environments.
pub const BUILD_GROUPS_VAR: &str = "BUILD_GROUPS";
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const VERSION_VAR: &str = "VERSION";

/// Immutable snapshot of the process environment, captured once per build.
///
/// Every decision reads from the snapshot instead of ambient process state,
/// so tests can construct deterministic inputs without mutating globals.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    #[must_use]
    pub fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}
