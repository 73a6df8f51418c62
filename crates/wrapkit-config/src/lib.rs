//! Environment-driven configuration for the Wrapkit services.
//!
//! # Design
//! - Pure data carriers live in `model.rs`; parsing and validation in `loader.rs`.
//! - Every knob has a documented default so the binary boots with no
//!   environment at all.
//! - The loader accepts an injected lookup function so tests never touch the
//!   process environment.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

/// Default values applied when the environment leaves a knob unset.
pub mod defaults;
/// Error types for configuration operations.
pub mod error;
/// Environment parsing and validation.
pub mod loader;
/// Typed configuration models.
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_from_env, load_with};
pub use model::{AppProfile, BuilderProfile, ConfigSnapshot, LogFormatChoice};
