//! Engine-agnostic build domain types, trait seams, and errors shared across
//! the workspace.
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

/// Error types shared by build services.
pub mod error;
/// Build domain types and DTOs.
pub mod model;
/// Workflow, inspector, and packaging-tool traits.
pub mod service;

pub use error::{BuildError, BuildResult};
pub use model::{
    BuildJob, BuildRequest, BuildStatus, artifact_filename, normalize_url, sanitize_app_name,
};
pub use service::{BuildInspector, BuildWorkflow, PackageTool, ToolCommand, ToolOutcome};
