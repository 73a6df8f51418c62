//! HTTP surface for the Wrapkit build service.
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

mod errors;
mod handlers;
mod models;
mod router;
mod sse;
mod state;
mod telemetry;

use std::sync::Arc;

use wrapkit_core::{BuildInspector, BuildWorkflow};

pub use router::ApiServer;

/// Bundle of workflow and inspector handles the HTTP surface operates on.
#[derive(Clone)]
pub struct BuildHandles {
    workflow: Arc<dyn BuildWorkflow>,
    inspector: Arc<dyn BuildInspector>,
}

impl BuildHandles {
    /// Construct a new bundle from workflow and inspector implementations.
    #[must_use]
    pub fn new(workflow: Arc<dyn BuildWorkflow>, inspector: Arc<dyn BuildInspector>) -> Self {
        Self {
            workflow,
            inspector,
        }
    }

    /// Workflow handle used to admit builds.
    #[must_use]
    pub fn workflow(&self) -> &Arc<dyn BuildWorkflow> {
        &self.workflow
    }

    /// Inspector handle used to poll build status.
    #[must_use]
    pub fn inspector(&self) -> &Arc<dyn BuildInspector> {
        &self.inspector
    }
}
