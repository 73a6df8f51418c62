//! Service wiring from environment configuration to a running API listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use wrapkit_api::{ApiServer, BuildHandles};
use wrapkit_builder::{BuildPipeline, CommandPackageTool};
use wrapkit_config::{ConfigSnapshot, LogFormatChoice};
use wrapkit_core::{BuildInspector, BuildWorkflow, PackageTool};
use wrapkit_events::EventBus;
use wrapkit_telemetry::{LogFormat, LoggingConfig, Metrics};

use crate::error::{AppError, AppResult};
use crate::orchestrator::BuildOrchestrator;
use crate::workers::BuildWorkers;

/// Dependencies required to bootstrap the Wrapkit application.
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    snapshot: ConfigSnapshot,
    events: EventBus,
    telemetry: Metrics,
    tool: Arc<dyn PackageTool>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary
    /// entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let snapshot = wrapkit_config::load_from_env()
            .map_err(|err| AppError::config("config.load_from_env", err))?;
        let logging = logging_config(&snapshot);
        let events = EventBus::new();
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

        Ok(Self {
            logging,
            snapshot,
            events,
            telemetry,
            tool: Arc::new(CommandPackageTool),
        })
    }
}

/// Entry point for the Wrapkit application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or application startup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify
/// testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    wrapkit_telemetry::init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!("Wrapkit application bootstrap starting");

    let BootstrapDependencies {
        logging: _,
        snapshot,
        events,
        telemetry,
        tool,
    } = dependencies;

    let pipeline = BuildPipeline::new(
        events.clone(),
        telemetry.clone(),
        tool,
        snapshot.builder.clone(),
    );
    let output_dir = pipeline.output_dir().to_path_buf();
    std::fs::create_dir_all(&output_dir).map_err(|err| {
        AppError::io(
            "bootstrap.create_output_dir",
            Some(output_dir.clone()),
            err,
        )
    })?;

    let orchestrator = Arc::new(BuildOrchestrator::new(
        pipeline,
        events.clone(),
        telemetry.clone(),
        BuildWorkers::new(snapshot.builder.max_active),
    ));
    let fold_worker = orchestrator.spawn_event_fold();
    info!("Build status catalog ready");

    let workflow: Arc<dyn BuildWorkflow> = orchestrator.clone();
    let inspector: Arc<dyn BuildInspector> = orchestrator;
    let handles = BuildHandles::new(workflow, inspector);
    let api = ApiServer::new(handles, events, telemetry, output_dir);

    let addr = SocketAddr::new(snapshot.app.bind_addr, snapshot.app.http_port);
    info!(addr = %addr, "Launching API listener");
    let serve_result = api.serve(addr).await;

    if !fold_worker.is_finished() {
        fold_worker.abort();
    }
    if let Err(err) = fold_worker.await {
        warn!(error = %err, "event fold worker join failed");
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

fn logging_config(snapshot: &ConfigSnapshot) -> LoggingConfig<'static> {
    let format = snapshot
        .app
        .log_format
        .map_or_else(LogFormat::infer, |choice| match choice {
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Pretty => LogFormat::Pretty,
        });
    LoggingConfig {
        format,
        ..LoggingConfig::default()
    }
}
