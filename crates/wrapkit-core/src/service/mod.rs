//! Workflow and tool traits implemented by build adapters.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use wrapkit_events::BuildId;

use crate::error::BuildResult;
use crate::model::{BuildRequest, BuildStatus};

/// Workflow façade exposed to the API layer for build admission.
#[async_trait]
pub trait BuildWorkflow: Send + Sync {
    /// Validate and admit a build, returning its identifier without waiting
    /// for the background pipeline.
    async fn submit(&self, request: BuildRequest) -> BuildResult<BuildId>;
}

/// Inspector trait used by API consumers to fetch build status snapshots.
#[async_trait]
pub trait BuildInspector: Send + Sync {
    /// Retrieve the full build status list.
    async fn list(&self) -> anyhow::Result<Vec<BuildStatus>>;

    /// Retrieve an individual build status snapshot.
    async fn get(&self, id: &BuildId) -> anyhow::Result<Option<BuildStatus>>;
}

/// Fully described invocation of the external packaging tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Program to execute (e.g. `flet`).
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Working directory for the invocation; the staging scope for builds.
    pub current_dir: PathBuf,
    /// Enforced wall-clock budget for the whole invocation.
    pub timeout: Duration,
}

/// Result of one packaging-tool invocation.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// The tool ran to completion; status is `None` when killed by a signal.
    Exited {
        /// Process exit code, when one was produced.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The tool exceeded the supplied wall-clock budget and was killed.
    TimedOut {
        /// Budget that was exceeded.
        limit: Duration,
    },
}

impl ToolOutcome {
    /// Whether the invocation finished with a zero exit status.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Exited { status: Some(0), .. })
    }
}

/// Single seam for the external packaging subprocess. The production
/// implementation shells out; test suites substitute doubles here.
#[async_trait]
pub trait PackageTool: Send + Sync {
    /// Run the tool to completion or timeout, capturing its output.
    async fn run(&self, command: ToolCommand) -> BuildResult<ToolOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_outcome_success_requires_zero_exit() {
        let ok = ToolOutcome::Exited {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.succeeded());

        let nonzero = ToolOutcome::Exited {
            status: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!nonzero.succeeded());

        let signalled = ToolOutcome::Exited {
            status: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!signalled.succeeded());

        let timed_out = ToolOutcome::TimedOut {
            limit: Duration::from_secs(300),
        };
        assert!(!timed_out.succeeded());
    }
}
