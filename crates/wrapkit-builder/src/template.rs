//! Wrapper project generation.
//!
//! The staged project is a minimal Flet application whose only page hosts a
//! WebView pointed at the requested URL. Values are substituted verbatim,
//! matching the behaviour of the packaging front-end this service drives.

use std::fs;
use std::path::Path;

use wrapkit_core::{BuildError, BuildResult};

/// Filename of the generated wrapper source inside the staging scope.
pub const WRAPPER_FILENAME: &str = "main.py";

/// Filename of the generated dependency manifest inside the staging scope.
pub const MANIFEST_FILENAME: &str = "requirements.txt";

/// Render the wrapper application source for the given name and URL.
#[must_use]
pub fn wrapper_source(app_name: &str, url: &str) -> String {
    format!(
        r#"import flet as ft

def main(page: ft.Page):
    page.title = "{app_name}"
    page.theme_mode = ft.ThemeMode.LIGHT
    page.padding = 0

    webview = ft.WebView(
        url="{url}",
        expand=True
    )
    page.add(webview)

ft.app(main)
"#
    )
}

/// Dependency manifest accompanying the wrapper source.
#[must_use]
pub const fn dependency_manifest() -> &'static str {
    "flet\n"
}

/// Write the wrapper source and manifest into the staging scope.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn stage_project(staging: &Path, app_name: &str, url: &str) -> BuildResult<()> {
    let wrapper_path = staging.join(WRAPPER_FILENAME);
    fs::write(&wrapper_path, wrapper_source(app_name, url))
        .map_err(|source| BuildError::io("stage_wrapper", &wrapper_path, source))?;

    let manifest_path = staging.join(MANIFEST_FILENAME);
    fs::write(&manifest_path, dependency_manifest())
        .map_err(|source| BuildError::io("stage_manifest", &manifest_path, source))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn wrapper_source_substitutes_name_and_url() {
        let source = wrapper_source("Demo", "https://example.com");
        assert!(source.contains(r#"page.title = "Demo""#));
        assert!(source.contains(r#"url="https://example.com""#));
        assert!(source.starts_with("import flet as ft"));
    }

    #[test]
    fn manifest_pins_the_packaging_framework() {
        assert_eq!(dependency_manifest(), "flet\n");
    }

    #[test]
    fn stage_project_writes_both_files() -> anyhow::Result<()> {
        let staging = TempDir::new()?;
        stage_project(staging.path(), "Demo", "https://example.com")?;

        let wrapper = std::fs::read_to_string(staging.path().join(WRAPPER_FILENAME))?;
        assert!(wrapper.contains("https://example.com"));
        let manifest = std::fs::read_to_string(staging.path().join(MANIFEST_FILENAME))?;
        assert_eq!(manifest, "flet\n");
        Ok(())
    }
}
