use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one controller run, distinguishing hard aborts from
/// soft-continue outcomes. Callers branch on `status`; nothing in this crate
/// uses panics or process exits for control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }
}

/// A problem in the application's own configuration, reported as a
/// `UserError` outcome rather than a build failure.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct BuildUserError {
    pub(crate) message: String,
    pub(crate) details: Value,
}

impl BuildUserError {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &Value {
        &self.details
    }
}

impl From<BuildUserError> for ExecutionOutcome {
    fn from(err: BuildUserError) -> Self {
        Self::user_error(err.message, err.details)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

impl CommandStatus {
    /// Process exit code the status maps to: 0 ok, 1 user error, 2 failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }
}
