//! Best-effort icon retrieval.
//!
//! Failures here are logged by the caller and never fail the build; only an
//! HTTP 200 body is treated as a valid icon payload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::{Client, StatusCode};

/// Directory inside the staging scope that receives fetched assets.
pub const ASSETS_DIR: &str = "assets";

/// Filename the fetched icon is stored under.
pub const ICON_FILENAME: &str = "icon.png";

/// Fetch the icon into `<staging>/assets/icon.png` within the given budget.
///
/// # Errors
///
/// Returns an error on transport failure, a non-200 response, or when the
/// payload cannot be written into the staging scope.
pub async fn fetch_icon(
    client: &Client,
    icon_url: &str,
    staging: &Path,
    timeout: Duration,
) -> Result<PathBuf> {
    let response = client
        .get(icon_url)
        .timeout(timeout)
        .send()
        .await
        .with_context(|| format!("icon request to {icon_url} failed"))?;
    ensure!(
        response.status() == StatusCode::OK,
        "icon request to {icon_url} returned status {}",
        response.status()
    );
    let payload = response
        .bytes()
        .await
        .with_context(|| format!("icon payload from {icon_url} could not be read"))?;

    let assets_dir = staging.join(ASSETS_DIR);
    tokio::fs::create_dir_all(&assets_dir)
        .await
        .with_context(|| format!("failed to create assets directory {}", assets_dir.display()))?;
    let icon_path = assets_dir.join(ICON_FILENAME);
    tokio::fs::write(&icon_path, &payload)
        .await
        .with_context(|| format!("failed to write icon to {}", icon_path.display()))?;

    Ok(icon_path)
}
