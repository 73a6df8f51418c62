//! Staged build pipeline turning an accepted submission into an installed
//! artifact.
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

/// Artifact discovery and installation.
pub mod artifact;
/// Best-effort icon retrieval.
pub mod fetch;
/// Wrapper project generation.
pub mod template;
/// Subprocess-backed packaging tool.
pub mod tool;

use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use wrapkit_config::BuilderProfile;
use wrapkit_core::model::ARTIFACT_EXTENSION;
use wrapkit_core::{
    BuildError, BuildJob, BuildResult, PackageTool, ToolCommand, ToolOutcome, artifact_filename,
};
use wrapkit_events::{Event, EventBus};
use wrapkit_telemetry::Metrics;

pub use tool::CommandPackageTool;

const HEALTH_COMPONENT: &str = "builder";

/// Pipeline stages, executed strictly in order for each build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Scaffold,
    FetchIcon,
    Compile,
    Collect,
}

impl Stage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Scaffold => "scaffold",
            Self::FetchIcon => "fetch_icon",
            Self::Compile => "compile",
            Self::Collect => "collect",
        }
    }
}

/// Service that runs the packaging pipeline for one build at a time per call
/// and reports lifecycle transitions over the shared event bus.
#[derive(Clone)]
pub struct BuildPipeline {
    events: EventBus,
    metrics: Metrics,
    tool: Arc<dyn PackageTool>,
    client: reqwest::Client,
    profile: BuilderProfile,
    health_degraded: Arc<Mutex<bool>>,
}

impl BuildPipeline {
    /// Construct a pipeline backed by the shared event bus and metrics registry.
    #[must_use]
    pub fn new(
        events: EventBus,
        metrics: Metrics,
        tool: Arc<dyn PackageTool>,
        profile: BuilderProfile,
    ) -> Self {
        Self {
            events,
            metrics,
            tool,
            client: reqwest::Client::new(),
            profile,
            health_degraded: Arc::new(Mutex::new(false)),
        }
    }

    /// Directory finished artifacts are installed into.
    #[must_use]
    pub fn output_dir(&self) -> &std::path::Path {
        &self.profile.output_dir
    }

    /// Run the full pipeline for one build and publish the terminal event.
    ///
    /// Every failure path is terminal for this build; the error is also
    /// returned so callers embedding the pipeline can assert on it.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure after publishing the `Failed` event.
    pub async fn execute(&self, job: BuildJob) -> BuildResult<String> {
        let result = self.run(&job).await;
        match &result {
            Ok(artifact) => {
                self.metrics.inc_build_completed();
                self.mark_recovered();
                info!(build_id = %job.id, artifact = %artifact, "build completed");
                self.publish(Event::Completed {
                    build_id: job.id.clone(),
                    artifact: artifact.clone(),
                });
            }
            Err(err) => {
                self.metrics.inc_build_failed();
                let message = err.diagnostic();
                // IO failures point at the host, not the submission; surface
                // them as service degradation in addition to the build result.
                if matches!(err, BuildError::Io { .. }) {
                    self.mark_degraded(&message);
                }
                warn!(build_id = %job.id, error = %message, "build failed");
                self.publish(Event::Failed {
                    build_id: job.id.clone(),
                    message,
                });
            }
        }
        result
    }

    async fn run(&self, job: &BuildJob) -> BuildResult<String> {
        // The staging scope lives for the duration of this call; TempDir
        // removes it on every exit path, including timeouts and errors.
        let staging = tempfile::Builder::new()
            .prefix("wrapkit-build-")
            .tempdir()
            .map_err(|err| BuildError::io("create_staging", std::env::temp_dir(), err))?;

        self.scaffold(job, &staging)?;
        self.fetch_icon(job, &staging).await;
        self.compile(job, &staging).await?;
        self.collect(job, &staging)
    }

    fn scaffold(&self, job: &BuildJob, staging: &TempDir) -> BuildResult<()> {
        self.enter_stage(job, Stage::Scaffold);
        template::stage_project(staging.path(), &job.app_name, &job.url)
            .inspect(|()| self.finish_stage(Stage::Scaffold, "completed"))
            .inspect_err(|_| self.finish_stage(Stage::Scaffold, "failed"))
    }

    async fn fetch_icon(&self, job: &BuildJob, staging: &TempDir) {
        let Some(icon_url) = job.icon_url.as_deref() else {
            self.finish_stage(Stage::FetchIcon, "skipped");
            return;
        };
        self.enter_stage(job, Stage::FetchIcon);
        match fetch::fetch_icon(
            &self.client,
            icon_url,
            staging.path(),
            self.profile.icon_timeout,
        )
        .await
        {
            Ok(path) => {
                debug!(build_id = %job.id, icon = %path.display(), "icon staged");
                self.finish_stage(Stage::FetchIcon, "completed");
            }
            Err(err) => {
                // Best-effort by contract: the build continues without an icon.
                warn!(build_id = %job.id, error = %format!("{err:#}"), "icon fetch failed");
                self.finish_stage(Stage::FetchIcon, "failed");
            }
        }
    }

    async fn compile(&self, job: &BuildJob, staging: &TempDir) -> BuildResult<()> {
        self.enter_stage(job, Stage::Compile);
        let command = ToolCommand {
            program: self.profile.tool_bin.clone(),
            args: vec![
                "build".to_string(),
                self.profile.package_kind.clone(),
                "--name".to_string(),
                job.app_name.clone(),
            ],
            current_dir: staging.path().to_path_buf(),
            timeout: self.profile.build_timeout,
        };

        let outcome = self.tool.run(command).await.inspect_err(|_| {
            self.finish_stage(Stage::Compile, "failed");
        })?;

        match outcome {
            ToolOutcome::Exited {
                status: Some(0),
                stdout,
                ..
            } => {
                debug!(build_id = %job.id, stdout = %stdout.trim(), "packaging tool succeeded");
                self.finish_stage(Stage::Compile, "completed");
                Ok(())
            }
            ToolOutcome::Exited {
                status,
                stdout,
                stderr,
            } => {
                self.finish_stage(Stage::Compile, "failed");
                let detail = if stderr.trim().is_empty() { stdout } else { stderr };
                Err(BuildError::ToolFailed {
                    status,
                    stderr: detail,
                })
            }
            ToolOutcome::TimedOut { limit } => {
                self.finish_stage(Stage::Compile, "failed");
                Err(BuildError::ToolTimedOut { limit })
            }
        }
    }

    fn collect(&self, job: &BuildJob, staging: &TempDir) -> BuildResult<String> {
        self.enter_stage(job, Stage::Collect);
        let Some(found) = artifact::find_artifact(staging.path(), ARTIFACT_EXTENSION) else {
            self.finish_stage(Stage::Collect, "failed");
            return Err(BuildError::ArtifactNotFound {
                dir: staging.path().to_path_buf(),
            });
        };

        let filename = artifact_filename(&job.app_name);
        artifact::install_artifact(&found, &self.profile.output_dir, &filename)
            .inspect(|installed| {
                debug!(build_id = %job.id, path = %installed.display(), "artifact installed");
                self.finish_stage(Stage::Collect, "completed");
            })
            .inspect_err(|_| self.finish_stage(Stage::Collect, "failed"))?;
        Ok(filename)
    }

    fn enter_stage(&self, job: &BuildJob, stage: Stage) {
        self.metrics.inc_build_stage(stage.as_str(), "started");
        self.publish(Event::StageProgress {
            build_id: job.id.clone(),
            stage: stage.as_str().to_string(),
        });
    }

    fn finish_stage(&self, stage: Stage, status: &str) {
        self.metrics.inc_build_stage(stage.as_str(), status);
    }

    fn publish(&self, event: Event) {
        self.metrics.inc_event(event.kind());
        let _ = self.events.publish(event);
    }

    fn mark_degraded(&self, detail: &str) {
        let mut guard = self
            .health_degraded
            .lock()
            .expect("builder health mutex poisoned");
        if *guard {
            drop(guard);
            warn!(component = HEALTH_COMPONENT, "build pipeline still degraded: {detail}");
        } else {
            *guard = true;
            drop(guard);
            warn!(component = HEALTH_COMPONENT, "build pipeline degraded: {detail}");
            self.publish(Event::HealthChanged {
                degraded: vec![HEALTH_COMPONENT.to_string()],
            });
        }
    }

    fn mark_recovered(&self) {
        let mut guard = self
            .health_degraded
            .lock()
            .expect("builder health mutex poisoned");
        if std::mem::take(&mut *guard) {
            drop(guard);
            self.publish(Event::HealthChanged { degraded: vec![] });
            info!(component = HEALTH_COMPONENT, "build pipeline recovered");
        }
    }
}
