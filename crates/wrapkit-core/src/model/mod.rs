//! Core build domain types and DTOs shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wrapkit_events::{BuildId, BuildState};

/// Placeholder application name applied when a submission omits one.
pub const DEFAULT_APP_NAME: &str = "WebApp";

/// File extension produced by the packaging tool.
pub const ARTIFACT_EXTENSION: &str = "apk";

/// Request payload for admitting a build into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Website the wrapper application should load.
    pub url: String,
    /// Friendly application name; defaults to [`DEFAULT_APP_NAME`].
    #[serde(default)]
    pub app_name: Option<String>,
    /// Optional icon image to embed in the staged project.
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Fully validated inputs handed to the build pipeline for one build.
#[derive(Debug, Clone)]
pub struct BuildJob {
    /// Identifier assigned at admission.
    pub id: BuildId,
    /// Target URL, normalized to carry a scheme.
    pub url: String,
    /// Application name as supplied (not yet sanitized for filenames).
    pub app_name: String,
    /// Optional icon URL; fetch failures are never fatal.
    pub icon_url: Option<String>,
}

/// High-level build status surfaced by the inspector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStatus {
    /// Identifier for the build.
    pub id: BuildId,
    /// Application name recorded at admission.
    pub app_name: String,
    /// Current lifecycle state.
    pub state: BuildState,
    /// Human-readable progress message.
    pub message: String,
    /// Output filename populated once the build completes.
    pub artifact: Option<String>,
    /// Timestamp when the build was accepted.
    pub added_at: DateTime<Utc>,
    /// Timestamp when the build reached a terminal state, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Timestamp of the last status update.
    pub last_updated: DateTime<Utc>,
}

impl BuildStatus {
    /// Construct the record seeded at admission time.
    #[must_use]
    pub fn accepted(id: BuildId, app_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            app_name: app_name.into(),
            state: BuildState::Building,
            message: "Build started".to_string(),
            artifact: None,
            added_at: now,
            completed_at: None,
            last_updated: now,
        }
    }

    /// Failure detail carried by a failed record, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            BuildState::Failed { message } => Some(message),
            BuildState::Building | BuildState::Completed => None,
        }
    }
}

/// Normalize a submitted URL so the generated wrapper always receives a
/// scheme. Bare hosts are prefixed with `https://`; URLs already carrying
/// `http://` or `https://` pass through unchanged.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Reduce an application name to a filesystem-safe stem: whitespace becomes
/// underscores and path-hostile characters are dropped.
#[must_use]
pub fn sanitize_app_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    if cleaned.is_empty() {
        DEFAULT_APP_NAME.to_string()
    } else {
        cleaned
    }
}

/// Final artifact filename for an application name. Two builds sharing an
/// app name therefore share an output path; last writer wins.
#[must_use]
pub fn artifact_filename(app_name: &str) -> String {
    format!("{}.{ARTIFACT_EXTENSION}", sanitize_app_name(app_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapkit_events::BuildId;

    #[test]
    fn normalize_url_prefixes_bare_hosts() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com "), "https://example.com");
    }

    #[test]
    fn normalize_url_passes_through_schemes() {
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn sanitize_app_name_replaces_whitespace_and_drops_hostile_chars() {
        assert_eq!(sanitize_app_name("My App"), "My_App");
        assert_eq!(sanitize_app_name("a/b\\c:d"), "abcd");
        assert_eq!(sanitize_app_name("   "), DEFAULT_APP_NAME);
    }

    #[test]
    fn artifact_filename_appends_extension() {
        assert_eq!(artifact_filename("Demo"), "Demo.apk");
        assert_eq!(artifact_filename("My App"), "My_App.apk");
    }

    #[test]
    fn accepted_status_starts_building() {
        let status = BuildStatus::accepted(BuildId::from("abcd1234"), "Demo");
        assert_eq!(status.state, wrapkit_events::BuildState::Building);
        assert_eq!(status.message, "Build started");
        assert!(status.artifact.is_none());
        assert!(status.completed_at.is_none());
        assert!(status.error().is_none());
    }

    #[test]
    fn failed_status_exposes_error_detail() {
        let mut status = BuildStatus::accepted(BuildId::from("abcd1234"), "Demo");
        status.state = wrapkit_events::BuildState::Failed {
            message: "tool exited with status 1".to_string(),
        };
        assert_eq!(status.error(), Some("tool exited with status 1"));
    }
}
