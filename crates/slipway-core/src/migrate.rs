use anyhow::Result;
use indexmap::IndexMap;
use serde_json::json;
use tracing::{info, warn};

use slipway_domain::{classify_schema_state, parse_schema_version, plan_migration, MigrationAction};

use crate::context::BuildContext;
use crate::database;
use crate::hooks;
use crate::outcome::ExecutionOutcome;
use crate::settings::{APP_ENV_VAR, DATABASE_URL_VAR, FORCE_MIGRATIONS_VAR, VERSION_VAR};

/// Metadata key holding the schema version the store was last migrated to.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";
/// Metadata key holding the one-level undo target for rollbacks.
pub const ROLLBACK_SCHEMA_VERSION_KEY: &str = "rollback_schema_version";

const FORWARD_TASK: &str = "db:migrate";
const ROLLBACK_TASK: &str = "db:rollback";

#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaSyncRequest {
    /// Caller-supplied rollback hint. A detected regression (recorded version
    /// ahead of the code's) forces a rollback regardless.
    pub rollback: bool,
}

/// Brings the persistent store's schema in line with the deployed code:
/// forward migrations, a rollback, or nothing.
///
/// Failure handling is asymmetric: a failed forward migration aborts the
/// build (the code may depend on the new schema), a failed rollback is a
/// warning and the build continues.
///
/// # Errors
/// Returns an error when an effect (filesystem, metadata, task spawn)
/// breaks; task-level failures are reported through the outcome instead.
pub fn sync_schema(ctx: &BuildContext, request: &SchemaSyncRequest) -> Result<ExecutionOutcome> {
    hooks::run_hook_steps(ctx, "before_migrations", &ctx.config().steps.before_migrations)?;

    let recorded = read_version(ctx, SCHEMA_VERSION_KEY)?.unwrap_or(0);
    let current = current_schema_version(ctx)?;
    let state = classify_schema_state(recorded, current);
    let force = ctx.env_flag_enabled(FORCE_MIGRATIONS_VAR);
    let stored_target = read_version(ctx, ROLLBACK_SCHEMA_VERSION_KEY)?;
    let plan = plan_migration(recorded, current, request.rollback, force, stored_target);

    if plan.action == MigrationAction::Noop {
        return Ok(ExecutionOutcome::success(
            "store schema already up to date",
            json!({
                "action": plan.action.as_str(),
                "state": state.as_str(),
                "recorded_version": recorded,
                "current_version": current,
                "hint": format!("set {FORCE_MIGRATIONS_VAR}=1 to rerun migrations"),
            }),
        ));
    }

    let rollback = plan.action == MigrationAction::Rollback;
    let task = if rollback { ROLLBACK_TASK } else { FORWARD_TASK };
    if !ctx.tasks().is_defined(task)? {
        return Ok(ExecutionOutcome::success(
            "no migration task defined",
            json!({ "action": plan.action.as_str(), "task": task }),
        ));
    }

    let env = migration_task_env(ctx, rollback.then_some(plan.resulting_version));
    if rollback {
        info!(version = plan.resulting_version, "rolling back database");
    } else {
        info!("running database migrations");
    }

    let report = ctx.tasks().invoke(task, &env)?;
    if report.success {
        ctx.metadata()
            .write(ROLLBACK_SCHEMA_VERSION_KEY, &plan.undo_version.to_string())?;
        ctx.metadata()
            .write(SCHEMA_VERSION_KEY, &plan.resulting_version.to_string())?;
        hooks::run_hook_steps(ctx, "after_migrations", &ctx.config().steps.after_migrations)?;

        let message = if rollback {
            format!(
                "database rollback completed ({:.2}s)",
                report.elapsed_seconds()
            )
        } else {
            format!(
                "database migrations completed ({:.2}s)",
                report.elapsed_seconds()
            )
        };
        return Ok(ExecutionOutcome::success(
            message,
            json!({
                "action": plan.action.as_str(),
                "state": state.as_str(),
                "schema_version": plan.resulting_version,
                "elapsed_seconds": report.elapsed_seconds(),
            }),
        ));
    }

    if rollback {
        warn!("database rollback failed");
        return Ok(ExecutionOutcome::success(
            "database rollback failed, continuing build",
            json!({
                "action": plan.action.as_str(),
                "warning": "database rollback failed",
                "target_version": plan.resulting_version,
            }),
        ));
    }
    Ok(ExecutionOutcome::failure(
        "database migrations failed",
        json!({ "action": plan.action.as_str(), "task": FORWARD_TASK }),
    ))
}

/// Reports where the store sits relative to the code's schema, without side
/// effects.
///
/// # Errors
/// Returns an error when the schema file or metadata cannot be read.
pub fn schema_status(ctx: &BuildContext) -> Result<ExecutionOutcome> {
    let recorded = read_version(ctx, SCHEMA_VERSION_KEY)?.unwrap_or(0);
    let current = current_schema_version(ctx)?;
    let state = classify_schema_state(recorded, current);
    Ok(ExecutionOutcome::success(
        format!("schema: {}", state.as_str()),
        json!({
            "state": state.as_str(),
            "recorded_version": recorded,
            "current_version": current,
        }),
    ))
}

fn current_schema_version(ctx: &BuildContext) -> Result<u64> {
    let path = ctx.app_root().join(&ctx.config().paths.schema);
    if !ctx.fs().exists(&path) {
        return Ok(0);
    }
    let source = ctx.fs().read_to_string(&path)?;
    parse_schema_version(&source)
}

fn read_version(ctx: &BuildContext, key: &str) -> Result<Option<u64>> {
    Ok(ctx
        .metadata()
        .read(key)?
        .and_then(|raw| raw.trim().parse::<u64>().ok()))
}

// Custom `[env]` entries merge last so they override everything this
// function computes, the rollback target included.
fn migration_task_env(ctx: &BuildContext, rollback_target: Option<u64>) -> Vec<(String, String)> {
    let mut env: IndexMap<String, String> = IndexMap::new();
    env.insert(
        APP_ENV_VAR.to_string(),
        ctx.env_var(APP_ENV_VAR).unwrap_or("production").to_string(),
    );
    env.insert(
        DATABASE_URL_VAR.to_string(),
        ctx.env_var(DATABASE_URL_VAR).map_or_else(
            || database::default_database_url(ctx.deps()),
            ToString::to_string,
        ),
    );
    if let Some(target) = rollback_target {
        env.insert(VERSION_VAR.to_string(), target.to_string());
    }
    for (key, value) in &ctx.config().env {
        env.insert(key.clone(), value.clone());
    }
    env.into_iter().collect()
}
