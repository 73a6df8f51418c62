//! Shared application state threaded through the router.

use std::path::PathBuf;

use wrapkit_events::EventBus;
use wrapkit_telemetry::Metrics;

use crate::BuildHandles;

/// State handed to every handler.
pub(crate) struct ApiState {
    /// Workflow and inspector handles for build admission and polling.
    pub(crate) builds: BuildHandles,
    /// Shared event bus backing the SSE endpoint.
    pub(crate) events: EventBus,
    /// Metrics registry rendered by `/metrics`.
    pub(crate) telemetry: Metrics,
    /// Directory artifacts are served from.
    pub(crate) output_dir: PathBuf,
}

impl ApiState {
    pub(crate) const fn new(
        builds: BuildHandles,
        events: EventBus,
        telemetry: Metrics,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            builds,
            events,
            telemetry,
            output_dir,
        }
    }
}
