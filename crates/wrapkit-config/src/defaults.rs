//! Defaults applied when the environment leaves a knob unset.

use std::net::{IpAddr, Ipv4Addr};

/// Address the API listener binds to by default.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// HTTP port the API listener binds to by default.
pub const HTTP_PORT: u16 = 8080;

/// Directory, relative to the working directory, where finished artifacts land.
pub const OUTPUT_DIR: &str = "builds";

/// Packaging tool binary invoked for each build.
pub const TOOL_BIN: &str = "flet";

/// Package kind passed to the tool's `build` subcommand.
pub const PACKAGE_KIND: &str = "apk";

/// Wall-clock budget for one packaging-tool invocation, in seconds.
pub const BUILD_TIMEOUT_SECS: u64 = 300;

/// Budget for fetching an optional icon, in seconds.
pub const ICON_TIMEOUT_SECS: u64 = 30;
