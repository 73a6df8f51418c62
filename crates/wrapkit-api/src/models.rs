//! Request and response DTOs for the HTTP surface.

use serde::{Deserialize, Serialize};
use wrapkit_core::{BuildRequest, BuildStatus};
use wrapkit_events::{BuildId, BuildState};

/// Submission payload accepted by `POST /build`.
///
/// `url` defaults to empty rather than failing deserialization so that a
/// missing field surfaces as the documented validation error, not a 422.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BuildSubmission {
    #[serde(default)]
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) app_name: Option<String>,
    #[serde(default)]
    pub(crate) icon_url: Option<String>,
}

impl From<BuildSubmission> for BuildRequest {
    fn from(submission: BuildSubmission) -> Self {
        Self {
            url: submission.url,
            app_name: submission.app_name,
            icon_url: submission.icon_url,
        }
    }
}

/// Body returned for an accepted submission.
#[derive(Debug, Serialize)]
pub(crate) struct BuildAccepted {
    pub(crate) message: &'static str,
    pub(crate) build_id: BuildId,
}

/// Body returned by the status-polling endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl StatusResponse {
    /// Sentinel response for identifiers the registry does not know.
    pub(crate) const fn unknown() -> Self {
        Self {
            status: "unknown",
            message: None,
            filename: None,
            error: None,
        }
    }
}

impl From<BuildStatus> for StatusResponse {
    fn from(status: BuildStatus) -> Self {
        let (label, error) = match status.state {
            BuildState::Building => ("building", None),
            BuildState::Completed => ("completed", None),
            BuildState::Failed { message } => ("failed", Some(message)),
        };
        Self {
            status: label,
            message: Some(status.message),
            filename: status.artifact,
            error,
        }
    }
}

/// Error body shared by all JSON error responses.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

/// Body returned by the health probe.
#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_maps_lifecycle_states() {
        let mut status = BuildStatus::accepted(BuildId::from("abcd1234"), "Demo");
        let building = StatusResponse::from(status.clone());
        assert_eq!(building.status, "building");
        assert_eq!(building.message.as_deref(), Some("Build started"));
        assert!(building.error.is_none());

        status.state = BuildState::Completed;
        status.artifact = Some("Demo.apk".to_string());
        let completed = StatusResponse::from(status.clone());
        assert_eq!(completed.status, "completed");
        assert_eq!(completed.filename.as_deref(), Some("Demo.apk"));

        status.state = BuildState::Failed {
            message: "tool exited with status 1".to_string(),
        };
        let failed = StatusResponse::from(status);
        assert_eq!(failed.status, "failed");
        assert_eq!(failed.error.as_deref(), Some("tool exited with status 1"));
    }

    #[test]
    fn unknown_response_carries_only_the_sentinel() {
        let body = serde_json::to_value(StatusResponse::unknown()).expect("serialize");
        assert_eq!(body, serde_json::json!({"status": "unknown"}));
    }

    #[test]
    fn submission_tolerates_missing_fields() {
        let submission: BuildSubmission = serde_json::from_str("{}").expect("deserialize");
        assert!(submission.url.is_empty());
        assert!(submission.app_name.is_none());
        assert!(submission.icon_url.is_none());
    }
}
