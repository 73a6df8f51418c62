//! Environment parsing and validation.
//!
//! # Design
//! - `load_with` accepts an injected lookup so tests never mutate the
//!   process environment.
//! - Unset knobs fall back to `defaults`; set knobs must parse and validate
//!   or loading fails with a structured [`ConfigError`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppProfile, BuilderProfile, ConfigSnapshot, LogFormatChoice};

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns an error if any environment variable is set to a value that fails
/// to parse or validate.
pub fn load_from_env() -> ConfigResult<ConfigSnapshot> {
    load_with(|name| std::env::var(name).ok())
}

/// Load configuration through an injected variable lookup.
///
/// # Errors
///
/// Returns an error if any supplied value fails to parse or validate.
pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<ConfigSnapshot> {
    let bind_addr = parse_bind_addr(lookup("WRAPKIT_BIND_ADDR"))?;
    // PORT is honoured as a fallback for parity with common PaaS conventions.
    let port_raw = lookup("WRAPKIT_HTTP_PORT").or_else(|| lookup("PORT"));
    let http_port = parse_port(port_raw)?;
    let log_format = lookup("WRAPKIT_LOG_FORMAT")
        .map(|raw| raw.trim().to_ascii_lowercase().parse::<LogFormatChoice>())
        .transpose()?;

    let output_dir = parse_non_empty(
        "WRAPKIT_OUTPUT_DIR",
        lookup("WRAPKIT_OUTPUT_DIR"),
        defaults::OUTPUT_DIR,
    )?;
    let tool_bin = parse_non_empty(
        "WRAPKIT_TOOL_BIN",
        lookup("WRAPKIT_TOOL_BIN"),
        defaults::TOOL_BIN,
    )?;
    let package_kind = parse_non_empty(
        "WRAPKIT_PACKAGE_KIND",
        lookup("WRAPKIT_PACKAGE_KIND"),
        defaults::PACKAGE_KIND,
    )?;
    let build_timeout = parse_secs(
        "WRAPKIT_BUILD_TIMEOUT_SECS",
        lookup("WRAPKIT_BUILD_TIMEOUT_SECS"),
        defaults::BUILD_TIMEOUT_SECS,
    )?;
    let icon_timeout = parse_secs(
        "WRAPKIT_ICON_TIMEOUT_SECS",
        lookup("WRAPKIT_ICON_TIMEOUT_SECS"),
        defaults::ICON_TIMEOUT_SECS,
    )?;
    let max_active = parse_max_active(lookup("WRAPKIT_MAX_ACTIVE"))?;

    let snapshot = ConfigSnapshot {
        app: AppProfile {
            bind_addr,
            http_port,
            log_format,
        },
        builder: BuilderProfile {
            output_dir: PathBuf::from(output_dir),
            tool_bin,
            package_kind,
            build_timeout,
            icon_timeout,
            max_active,
        },
    };
    debug!(
        port = snapshot.app.http_port,
        output_dir = %snapshot.builder.output_dir.display(),
        "configuration loaded"
    );
    Ok(snapshot)
}

fn parse_bind_addr(raw: Option<String>) -> ConfigResult<IpAddr> {
    raw.map_or(Ok(defaults::BIND_ADDR), |value| {
        value.trim().parse::<IpAddr>().map_err(|_| {
            ConfigError::invalid("WRAPKIT_BIND_ADDR", value, "not a valid IP address")
        })
    })
}

fn parse_port(raw: Option<String>) -> ConfigResult<u16> {
    let Some(value) = raw else {
        return Ok(defaults::HTTP_PORT);
    };
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::invalid("WRAPKIT_HTTP_PORT", value.clone(), "not a valid port"))?;
    if port == 0 {
        return Err(ConfigError::invalid(
            "WRAPKIT_HTTP_PORT",
            value,
            "port must be non-zero",
        ));
    }
    Ok(port)
}

fn parse_non_empty(
    field: &'static str,
    raw: Option<String>,
    default: &str,
) -> ConfigResult<String> {
    let value = raw.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, value, "value cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_secs(field: &'static str, raw: Option<String>, default: u64) -> ConfigResult<Duration> {
    let Some(value) = raw else {
        return Ok(Duration::from_secs(default));
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid(field, value.clone(), "not a valid number of seconds"))?;
    if secs == 0 {
        return Err(ConfigError::invalid(field, value, "timeout must be positive"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_max_active(raw: Option<String>) -> ConfigResult<Option<usize>> {
    let Some(value) = raw else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<usize>().map_err(|_| {
        ConfigError::invalid("WRAPKIT_MAX_ACTIVE", value.clone(), "not a valid count")
    })?;
    if parsed == 0 {
        return Err(ConfigError::invalid(
            "WRAPKIT_MAX_ACTIVE",
            value,
            "cap must be positive when set",
        ));
    }
    Ok(Some(parsed))
}
