use tracing::debug;

/// What the asset pipeline should do this build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetDecision {
    /// Assets were produced out-of-band or no compile task exists.
    Skip,
    /// The recorded fingerprint matches the current one; reuse the cache.
    RestoreFromCache,
    /// No usable prior state, or inputs changed, or recompilation was forced.
    Recompute,
}

impl AssetDecision {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetDecision::Skip => "skip",
            AssetDecision::RestoreFromCache => "restore-from-cache",
            AssetDecision::Recompute => "recompute",
        }
    }
}

/// Decides between restoring cached assets and recompiling them.
///
/// A missing or empty prior fingerprint never matches; comparison is plain
/// byte equality, nothing fuzzier.
pub fn plan_assets(prior: Option<&str>, current: &str, force: bool) -> AssetDecision {
    if force {
        return AssetDecision::Recompute;
    }
    match prior {
        Some(prior) if !prior.is_empty() && prior == current => AssetDecision::RestoreFromCache,
        _ => AssetDecision::Recompute,
    }
}

/// Where the persistent store sits relative to the code's schema knowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaState {
    NoPriorState,
    InSync,
    NeedsForward,
    NeedsRollback,
}

impl SchemaState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaState::NoPriorState => "no-prior-state",
            SchemaState::InSync => "in-sync",
            SchemaState::NeedsForward => "needs-forward",
            SchemaState::NeedsRollback => "needs-rollback",
        }
    }
}

#[must_use]
pub fn classify_schema_state(recorded: u64, current: u64) -> SchemaState {
    if recorded == 0 && current > 0 {
        SchemaState::NoPriorState
    } else if recorded == current {
        SchemaState::InSync
    } else if recorded < current {
        SchemaState::NeedsForward
    } else {
        SchemaState::NeedsRollback
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationAction {
    Noop,
    Forward,
    Rollback,
}

impl MigrationAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationAction::Noop => "noop",
            MigrationAction::Forward => "forward",
            MigrationAction::Rollback => "rollback",
        }
    }
}

/// A migration decision plus the bookkeeping writes it implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    pub action: MigrationAction,
    /// Version the store holds once the task succeeds. For a rollback this is
    /// also the `VERSION` parameter handed to the task.
    pub resulting_version: u64,
    /// Value to record as the future rollback target.
    pub undo_version: u64,
}

/// Decides between applying forward migrations, rolling back, or doing
/// nothing.
///
/// A recorded version ahead of the current one forces a rollback regardless
/// of the caller's hint: the deployed code's schema knowledge has regressed
/// relative to the store. When a stored rollback target exists it replaces
/// the recorded version as the target, so repeated rollbacks converge on the
/// stored value instead of bouncing between two versions. The rollback path
/// never skips on equality; the forward path skips only when the versions
/// match and no force flag is set.
pub fn plan_migration(
    recorded: u64,
    current: u64,
    rollback_hint: bool,
    force: bool,
    stored_rollback_target: Option<u64>,
) -> MigrationPlan {
    let rollback = rollback_hint || recorded > current;
    if rollback {
        let target = stored_rollback_target.unwrap_or(recorded);
        debug!(recorded, current, target, "planning rollback");
        return MigrationPlan {
            action: MigrationAction::Rollback,
            resulting_version: target,
            undo_version: target,
        };
    }
    if !force && recorded == current {
        return MigrationPlan {
            action: MigrationAction::Noop,
            resulting_version: current,
            undo_version: recorded,
        };
    }
    debug!(recorded, current, "planning forward migration");
    MigrationPlan {
        action: MigrationAction::Forward,
        resulting_version: current,
        undo_version: recorded,
    }
}
