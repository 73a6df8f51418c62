//! Route handlers for the build service.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Path as AxumPath, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{error, info, warn};
use wrapkit_core::BuildError;
use wrapkit_events::BuildId;

use crate::errors::ApiError;
use crate::models::{BuildAccepted, BuildSubmission, HealthResponse, StatusResponse};
use crate::state::ApiState;

/// Embedded single-page front-end; presentation only.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Media type for Android packages served by the download endpoint.
const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

pub(crate) async fn submit_build(
    State(state): State<Arc<ApiState>>,
    Json(submission): Json<BuildSubmission>,
) -> Result<(StatusCode, Json<BuildAccepted>), ApiError> {
    let build_id = state
        .builds
        .workflow()
        .submit(submission.into())
        .await
        .map_err(|err| match err {
            BuildError::MissingInput { .. } => ApiError::bad_request("Website URL is required"),
            other => {
                error!(error = %other, "build submission failed unexpectedly");
                ApiError::internal(other.diagnostic())
            }
        })?;

    info!(build_id = %build_id, "build submission accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(BuildAccepted {
            message: "Build started",
            build_id,
        }),
    ))
}

pub(crate) async fn build_status(
    State(state): State<Arc<ApiState>>,
    AxumPath(build_id): AxumPath<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = BuildId::from(build_id);
    let status = state.builds.inspector().get(&id).await.map_err(|err| {
        error!(error = %err, build_id = %id, "failed to read build status");
        ApiError::internal("failed to query build status")
    })?;

    Ok(Json(
        status.map_or_else(StatusResponse::unknown, StatusResponse::from),
    ))
}

pub(crate) async fn download_artifact(
    State(state): State<Arc<ApiState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(ApiError::bad_request("invalid artifact filename"));
    }

    let path = state.output_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            info!(filename = %filename, size = bytes.len(), "artifact download");
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, APK_CONTENT_TYPE)
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                )
                .body(Body::from(bytes))
                .map_err(|err| {
                    error!(error = %err, "failed to build download response");
                    ApiError::internal("failed to build download response")
                })
        }
        Err(err) => {
            warn!(filename = %filename, error = %err, "artifact not available");
            Ok((StatusCode::NOT_FOUND, "File not found").into_response())
        }
    }
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}
