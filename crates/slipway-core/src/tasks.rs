use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::effects::{TaskReport, TaskRunner};
use crate::process;

/// Task runner shelling out to the application's task program (`rake` by
/// default). Definedness is probed with the program's `-W <task>` listing;
/// invocation streams the task's output into the build log.
pub struct SystemTaskRunner {
    program: String,
    app_root: PathBuf,
}

impl SystemTaskRunner {
    #[must_use]
    pub fn new(program: String, app_root: PathBuf) -> Self {
        Self { program, app_root }
    }
}

impl TaskRunner for SystemTaskRunner {
    fn is_defined(&self, task: &str) -> Result<bool> {
        let output = process::run_captured(
            &self.program,
            &["-W".to_string(), task.to_string()],
            &[],
            &self.app_root,
        )?;
        let defined = output.success() && !output.stdout.trim().is_empty();
        debug!(task, defined, "probed task definition");
        Ok(defined)
    }

    fn invoke(&self, task: &str, env: &[(String, String)]) -> Result<TaskReport> {
        let output = process::run_streaming(&self.program, &[task.to_string()], env, &self.app_root)?;
        debug!(task, code = output.code, "task finished");
        Ok(TaskReport {
            success: output.success(),
            elapsed: output.elapsed,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // A stand-in task program: `probe.sh -W <task>` lists the task when a
    // marker file exists, and `probe.sh <task>` exits with the code stored in
    // another marker file.
    fn fake_runner(dir: &std::path::Path, defined: bool, exit_code: i32) -> Result<String> {
        let script = dir.join("runner.sh");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nif [ \"$1\" = \"-W\" ]; then\n  {}\nfi\nexit {exit_code}\n",
                if defined { "echo \"$2\"; exit 0" } else { "exit 0" }
            ),
        )?;
        let mut permissions = std::fs::metadata(&script)?.permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut permissions, 0o755);
        std::fs::set_permissions(&script, permissions)?;
        Ok(script.to_string_lossy().to_string())
    }

    #[test]
    fn probe_distinguishes_defined_from_undefined_tasks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let defined = SystemTaskRunner::new(fake_runner(dir.path(), true, 0)?, dir.path().into());
        assert!(defined.is_defined("assets:precompile")?);

        let undefined =
            SystemTaskRunner::new(fake_runner(dir.path(), false, 0)?, dir.path().into());
        assert!(!undefined.is_defined("assets:precompile")?);
        Ok(())
    }

    #[test]
    fn invoke_reports_failure_and_elapsed_time() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let runner = SystemTaskRunner::new(fake_runner(dir.path(), true, 3)?, dir.path().into());
        let report = runner.invoke("db:migrate", &[])?;
        assert!(!report.success);
        assert!(report.elapsed_seconds() >= 0.0);
        Ok(())
    }
}
