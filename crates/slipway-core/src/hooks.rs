use anyhow::Result;
use tracing::{info, warn};

use crate::context::BuildContext;
use crate::process;

/// Runs the app's custom build steps for one hook phase. Step failures are
/// outside this core's contract; they are logged and the build continues.
pub(crate) fn run_hook_steps(ctx: &BuildContext, phase: &str, steps: &[String]) -> Result<()> {
    for step in steps {
        info!(phase, step, "running custom build step");
        let custom_env: Vec<(String, String)> = ctx
            .config()
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let output = process::run_streaming(
            "/bin/sh",
            &["-c".to_string(), step.clone()],
            &custom_env,
            ctx.app_root(),
        )?;
        if !output.success() {
            warn!(phase, step, code = output.code, "custom build step exited nonzero");
        }
    }
    Ok(())
}
