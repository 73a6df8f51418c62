//! Subprocess-backed implementation of the packaging tool seam.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use wrapkit_core::{BuildError, BuildResult, PackageTool, ToolCommand, ToolOutcome};

/// `PackageTool` implementation that shells out to the configured binary.
///
/// The child inherits nothing: stdin is closed and stdout/stderr are captured
/// verbatim for diagnostics. `kill_on_drop` guarantees the process dies when
/// the timeout fires and the wait future is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandPackageTool;

#[async_trait]
impl PackageTool for CommandPackageTool {
    async fn run(&self, command: ToolCommand) -> BuildResult<ToolOutcome> {
        debug!(
            program = %command.program,
            args = ?command.args,
            cwd = %command.current_dir.display(),
            "invoking packaging tool"
        );

        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BuildError::ToolUnavailable {
                program: command.program.clone(),
                source,
            })?;

        match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutcome::Exited {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(source)) => Err(BuildError::io(
                "tool_wait",
                command.current_dir.clone(),
                source,
            )),
            Err(_elapsed) => Ok(ToolOutcome::TimedOut {
                limit: command.timeout,
            }),
        }
    }
}
