//! # Design
//!
//! - Provide structured, constant-message errors for the build pipeline.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors produced by build admission and the packaging pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required submission field was missing or empty.
    #[error("missing required input")]
    MissingInput {
        /// Field that failed validation.
        field: &'static str,
    },
    /// IO failures while staging or collecting build output.
    #[error("build io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The packaging tool could not be spawned.
    #[error("packaging tool unavailable")]
    ToolUnavailable {
        /// Program that failed to launch.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The packaging tool exited unsuccessfully.
    #[error("packaging tool failed")]
    ToolFailed {
        /// Exit status reported by the tool, when one was produced.
        status: Option<i32>,
        /// Captured standard error output.
        stderr: String,
    },
    /// The packaging tool exceeded its wall-clock budget.
    #[error("packaging tool timed out")]
    ToolTimedOut {
        /// Enforced wall-clock limit.
        limit: Duration,
    },
    /// The tool reported success but no artifact was found in the staging tree.
    #[error("artifact not found after build")]
    ArtifactNotFound {
        /// Directory that was scanned.
        dir: PathBuf,
    },
}

impl BuildError {
    /// Convenience constructor for IO failures with operation context.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Human-readable diagnostic suitable for a status record.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::MissingInput { field } => format!("missing required input '{field}'"),
            Self::Io {
                operation, path, ..
            } => format!("io failure during {operation} at {}", path.display()),
            Self::ToolUnavailable { program, .. } => {
                format!("packaging tool '{program}' could not be launched")
            }
            Self::ToolFailed { status, stderr } => {
                let code = status.map_or_else(|| "signal".to_string(), |c| c.to_string());
                if stderr.trim().is_empty() {
                    format!("packaging tool exited with status {code}")
                } else {
                    format!("packaging tool exited with status {code}: {}", stderr.trim())
                }
            }
            Self::ToolTimedOut { limit } => {
                format!("packaging tool timed out after {}s", limit.as_secs())
            }
            Self::ArtifactNotFound { dir } => {
                format!("artifact not found under {}", dir.display())
            }
        }
    }
}
