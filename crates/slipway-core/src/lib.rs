#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod artifacts;
pub mod assets;
pub mod config;
pub mod context;
pub mod database;
pub mod effects;
pub mod fingerprint;
mod hooks;
pub mod metadata;
pub mod migrate;
pub mod outcome;
pub mod process;
pub mod settings;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::assets::{asset_status, sync_assets, ASSETS_VERSION_KEY};
pub use crate::config::{resolve_cache_root, BuildConfig, CacheLocation};
pub use crate::context::BuildContext;
pub use crate::effects::{
    ArtifactCache, ContentFingerprinter, DependencyIndex, Effects, FileSystem, MetadataStore,
    SharedEffects, SystemEffects, TaskReport, TaskRunner,
};
pub use crate::migrate::{
    schema_status, sync_schema, SchemaSyncRequest, ROLLBACK_SCHEMA_VERSION_KEY,
    SCHEMA_VERSION_KEY,
};
pub use crate::outcome::{BuildUserError, CommandStatus, ExecutionOutcome};
pub use crate::settings::{
    EnvSnapshot, CACHE_PATH_VAR, FORCE_ASSETS_VAR, FORCE_MIGRATIONS_VAR, TASK_RUNNER_VAR,
};
