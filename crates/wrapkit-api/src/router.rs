//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    http::{Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;
use wrapkit_events::EventBus;
use wrapkit_telemetry::{Metrics, build_sha};

use crate::BuildHandles;
use crate::handlers::{build_status, download_artifact, health, index, metrics, submit_build};
use crate::sse::stream_events;
use crate::state::ApiState;
use crate::telemetry::HttpMetricsLayer;

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Axum router wrapper that hosts the Wrapkit API services.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server with shared dependencies wired through
    /// application state.
    #[must_use]
    pub fn new(
        builds: BuildHandles,
        events: EventBus,
        telemetry: Metrics,
        output_dir: PathBuf,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            builds,
            events,
            telemetry.clone(),
            output_dir,
        ));

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let method = request.method().clone();
                let uri_path = request.uri().path();
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %method,
                    route = %uri_path,
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(wrapkit_telemetry::propagate_request_id_layer())
            .layer(wrapkit_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::build_router()
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn build_router() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/build", post(submit_build))
            .route("/status/{build_id}", get(build_status))
            .route("/download/{filename}", get(download_artifact))
            .route("/metrics", get(metrics))
            .route("/events", get(stream_events))
    }

    /// Serve the API using the configured router on the supplied address.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server
    /// terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        tracing::info!("Starting API on {}", addr);
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router.into_make_service()).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wrapkit_core::{BuildError, BuildInspector, BuildRequest, BuildResult, BuildStatus, BuildWorkflow};
    use wrapkit_events::{BuildId, BuildState};

    /// Workflow double mirroring the orchestrator's admission validation.
    struct StubWorkflow;

    #[async_trait]
    impl BuildWorkflow for StubWorkflow {
        async fn submit(&self, request: BuildRequest) -> BuildResult<BuildId> {
            if request.url.trim().is_empty() {
                return Err(BuildError::MissingInput { field: "url" });
            }
            Ok(BuildId::from("abcd1234"))
        }
    }

    #[derive(Default)]
    struct StubInspector {
        statuses: HashMap<String, BuildStatus>,
    }

    impl StubInspector {
        fn with_status(status: BuildStatus) -> Self {
            let mut statuses = HashMap::new();
            statuses.insert(status.id.as_str().to_string(), status);
            Self { statuses }
        }
    }

    #[async_trait]
    impl BuildInspector for StubInspector {
        async fn list(&self) -> anyhow::Result<Vec<BuildStatus>> {
            Ok(self.statuses.values().cloned().collect())
        }

        async fn get(&self, id: &BuildId) -> anyhow::Result<Option<BuildStatus>> {
            Ok(self.statuses.get(id.as_str()).cloned())
        }
    }

    fn server_with(inspector: StubInspector, output_dir: PathBuf) -> ApiServer {
        let handles = BuildHandles::new(Arc::new(StubWorkflow), Arc::new(inspector));
        let telemetry = Metrics::new().expect("metrics");
        ApiServer::new(handles, EventBus::with_capacity(16), telemetry, output_dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[tokio::test]
    async fn health_is_always_healthy() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn index_serves_the_embedded_page() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert!(String::from_utf8_lossy(&bytes).contains("APK Builder"));
    }

    #[tokio::test]
    async fn missing_url_is_rejected_with_the_documented_error() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::post("/build")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"url": ""}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Website URL is required"})
        );
    }

    #[tokio::test]
    async fn valid_submission_is_accepted_with_an_identifier() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::post("/build")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"url": "example.com", "app_name": "Demo"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Build started");
        assert_eq!(body["build_id"], "abcd1234");
    }

    #[tokio::test]
    async fn unknown_identifiers_poll_as_unknown() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/status/ffffffff")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "unknown"}));
    }

    #[tokio::test]
    async fn completed_builds_report_their_filename() {
        let mut status = BuildStatus::accepted(BuildId::from("abcd1234"), "Demo");
        status.state = BuildState::Completed;
        status.artifact = Some("Demo.apk".to_string());
        status.message = "Build completed".to_string();

        let output = TempDir::new().expect("tempdir");
        let server = server_with(
            StubInspector::with_status(status),
            output.path().to_path_buf(),
        );
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/status/abcd1234")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["filename"], "Demo.apk");
    }

    #[tokio::test]
    async fn downloads_serve_artifacts_as_attachments() {
        let output = TempDir::new().expect("tempdir");
        std::fs::write(output.path().join("Demo.apk"), b"package-bytes").expect("artifact");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/download/Demo.apk")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(axum::http::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("disposition header");
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("Demo.apk"));
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"package-bytes");
    }

    #[tokio::test]
    async fn missing_artifacts_are_a_plain_text_404() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/download/Nope.apk")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(String::from_utf8_lossy(&bytes), "File not found");
    }

    #[tokio::test]
    async fn traversal_attempts_are_rejected() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/download/..%2Fsecret.apk")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_render_in_text_exposition_format() {
        let output = TempDir::new().expect("tempdir");
        let server = server_with(StubInspector::default(), output.path().to_path_buf());
        let response = server
            .router()
            .clone()
            .oneshot(
                Request::get("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
