//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers used by bootstrap and the services.
//! - Parsing from the environment lives in `loader.rs`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// HTTP listener profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppProfile {
    /// IP address (and interface) the API server should bind to.
    pub bind_addr: IpAddr,
    /// HTTP port the API server should bind to.
    pub http_port: u16,
    /// Requested log output format, when the environment expresses one.
    pub log_format: Option<LogFormatChoice>,
}

/// Build pipeline profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderProfile {
    /// Directory where finished artifacts are installed.
    pub output_dir: PathBuf,
    /// Packaging tool binary invoked for each build.
    pub tool_bin: String,
    /// Package kind passed to the tool's `build` subcommand.
    pub package_kind: String,
    /// Wall-clock budget for one packaging-tool invocation.
    pub build_timeout: Duration,
    /// Budget for fetching an optional icon.
    pub icon_timeout: Duration,
    /// Optional cap on concurrently running builds; `None` reproduces the
    /// reference behaviour of unbounded admission.
    pub max_active: Option<usize>,
}

/// Snapshot of all configuration consumed at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// HTTP listener profile.
    pub app: AppProfile,
    /// Build pipeline profile.
    pub builder: BuilderProfile,
}

/// Log output format requested through the environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatChoice {
    /// Structured JSON log lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl FromStr for LogFormatChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::invalid(
                "WRAPKIT_LOG_FORMAT",
                other,
                "expected 'json' or 'pretty'",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("json".parse::<LogFormatChoice>(), Ok(LogFormatChoice::Json));
        assert_eq!(
            "pretty".parse::<LogFormatChoice>(),
            Ok(LogFormatChoice::Pretty)
        );
        assert!("verbose".parse::<LogFormatChoice>().is_err());
    }
}
