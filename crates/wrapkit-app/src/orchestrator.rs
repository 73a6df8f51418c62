//! Build orchestrator that admits submissions, dispatches pipeline work, and
//! folds bus events into the in-memory status catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wrapkit_builder::BuildPipeline;
use wrapkit_core::model::DEFAULT_APP_NAME;
use wrapkit_core::{
    BuildError, BuildInspector, BuildJob, BuildRequest, BuildResult, BuildStatus, BuildWorkflow,
    normalize_url,
};
use wrapkit_events::{BuildId, BuildState, Event, EventBus};
use wrapkit_telemetry::Metrics;

use crate::workers::BuildWorkers;

/// Coordinates build admission with the pipeline and owns the status catalog
/// that the HTTP surface polls.
pub(crate) struct BuildOrchestrator {
    pipeline: BuildPipeline,
    events: EventBus,
    telemetry: Metrics,
    catalog: Arc<BuildCatalog>,
    workers: BuildWorkers,
}

impl BuildOrchestrator {
    pub(crate) fn new(
        pipeline: BuildPipeline,
        events: EventBus,
        telemetry: Metrics,
        workers: BuildWorkers,
    ) -> Self {
        Self {
            pipeline,
            events,
            telemetry,
            catalog: Arc::new(BuildCatalog::new()),
            workers,
        }
    }

    /// Validate and admit a submission, returning without waiting on the
    /// background pipeline.
    pub(crate) async fn submit(&self, request: BuildRequest) -> BuildResult<BuildId> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(BuildError::MissingInput { field: "url" });
        }
        let app_name = request
            .app_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_APP_NAME)
            .to_string();
        let icon_url = request
            .icon_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let job = BuildJob {
            id: BuildId::generate(),
            url: normalize_url(url),
            app_name: app_name.clone(),
            icon_url,
        };
        let id = job.id.clone();

        let accepted = Event::BuildAccepted {
            build_id: id.clone(),
            app_name,
        };
        // Seed the catalog synchronously so an immediate poll observes
        // `building`; the folded copy of this event is a no-op.
        self.catalog.observe(&accepted).await;
        self.telemetry.inc_build_accepted();
        self.telemetry.inc_event(accepted.kind());
        let _ = self.events.publish(accepted);

        let pipeline = self.pipeline.clone();
        self.workers.spawn(async move {
            // Terminal outcomes are reported over the bus by the pipeline.
            let _ = pipeline.execute(job).await;
        });

        info!(build_id = %id, "build admitted");
        Ok(id)
    }

    async fn handle_event(&self, event: &Event) {
        self.catalog.observe(event).await;
        self.telemetry.set_active_builds(self.catalog.active().await);
    }

    /// Spawn the background task that folds bus events into the catalog.
    pub(crate) fn spawn_event_fold(self: &Arc<Self>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut stream = orchestrator.events.subscribe(None);
            while let Some(envelope) = stream.next().await {
                orchestrator.handle_event(&envelope.event).await;
            }
        })
    }
}

#[async_trait]
impl BuildWorkflow for BuildOrchestrator {
    async fn submit(&self, request: BuildRequest) -> BuildResult<BuildId> {
        Self::submit(self, request).await
    }
}

#[async_trait]
impl BuildInspector for BuildOrchestrator {
    async fn list(&self) -> anyhow::Result<Vec<BuildStatus>> {
        Ok(self.catalog.list().await)
    }

    async fn get(&self, id: &BuildId) -> anyhow::Result<Option<BuildStatus>> {
        Ok(self.catalog.get(id).await)
    }
}

/// In-memory status registry keyed by build identifier. Records are never
/// explicitly destroyed; the map lives for the process lifetime.
#[derive(Default)]
struct BuildCatalog {
    entries: RwLock<HashMap<BuildId, BuildStatus>>,
}

impl BuildCatalog {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn observe(&self, event: &Event) {
        let mut entries = self.entries.write().await;
        Self::apply_event(&mut entries, event);
    }

    async fn list(&self) -> Vec<BuildStatus> {
        let mut values: Vec<_> = {
            let entries = self.entries.read().await;
            entries.values().cloned().collect()
        };
        values.sort_by(|a, b| {
            b.added_at
                .cmp(&a.added_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        values
    }

    async fn get(&self, id: &BuildId) -> Option<BuildStatus> {
        self.entries.read().await.get(id).cloned()
    }

    async fn active(&self) -> i64 {
        let entries = self.entries.read().await;
        let count = entries
            .values()
            .filter(|status| matches!(status.state, BuildState::Building))
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn apply_event(entries: &mut HashMap<BuildId, BuildStatus>, event: &Event) {
        match event {
            Event::BuildAccepted { build_id, app_name } => {
                // Insert-only: a replayed acceptance can never regress a
                // record that already advanced to a terminal state.
                entries
                    .entry(build_id.clone())
                    .or_insert_with(|| BuildStatus::accepted(build_id.clone(), app_name.clone()));
            }
            Event::StageProgress { build_id, stage } => {
                if let Some(entry) = entries.get_mut(build_id)
                    && matches!(entry.state, BuildState::Building)
                {
                    entry.message = stage_message(stage).to_string();
                    entry.last_updated = Utc::now();
                }
            }
            Event::Completed { build_id, artifact } => {
                if let Some(entry) = entries.get_mut(build_id) {
                    let now = Utc::now();
                    entry.state = BuildState::Completed;
                    entry.message = "Build completed".to_string();
                    entry.artifact = Some(artifact.clone());
                    entry.completed_at = Some(now);
                    entry.last_updated = now;
                } else {
                    debug!(build_id = %build_id, "completion for untracked build dropped");
                }
            }
            Event::Failed { build_id, message } => {
                if let Some(entry) = entries.get_mut(build_id) {
                    let now = Utc::now();
                    entry.state = BuildState::Failed {
                        message: message.clone(),
                    };
                    entry.message = "Build failed".to_string();
                    entry.completed_at = Some(now);
                    entry.last_updated = now;
                } else {
                    debug!(build_id = %build_id, "failure for untracked build dropped");
                }
            }
            Event::HealthChanged { .. } => {}
        }
    }
}

/// Progress text shown to pollers while a stage runs.
fn stage_message(stage: &str) -> &'static str {
    match stage {
        "scaffold" => "Creating project files",
        "fetch_icon" => "Downloading assets",
        "compile" => "Building APK",
        "collect" => "Collecting artifact",
        _ => "Building",
    }
}
