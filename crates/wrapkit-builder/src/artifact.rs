//! Artifact discovery and installation.
//!
//! The packaging tool's output layout is not assumed to be stable beyond
//! "some file with the expected extension appears somewhere under the
//! staging scope", so discovery is a recursive scan.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wrapkit_core::{BuildError, BuildResult};

/// Locate the first file carrying the expected extension under `root`.
#[must_use]
pub fn find_artifact(root: &Path, extension: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(walkdir::DirEntry::into_path)
}

/// Copy the located artifact to its stable name inside the output directory.
///
/// # Errors
///
/// Returns an error if the output directory cannot be prepared or the copy
/// fails.
pub fn install_artifact(source: &Path, output_dir: &Path, filename: &str) -> BuildResult<PathBuf> {
    fs::create_dir_all(output_dir)
        .map_err(|err| BuildError::io("prepare_output_dir", output_dir, err))?;
    let destination = output_dir.join(filename);
    fs::copy(source, &destination)
        .map_err(|err| BuildError::io("install_artifact", &destination, err))?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_artifact_scans_nested_directories() -> anyhow::Result<()> {
        let staging = TempDir::new()?;
        let nested = staging.path().join("build").join("apk");
        fs::create_dir_all(&nested)?;
        fs::write(nested.join("app-release.apk"), b"bytes")?;
        fs::write(staging.path().join("main.py"), b"source")?;

        let found = find_artifact(staging.path(), "apk").expect("artifact located");
        assert!(found.ends_with("app-release.apk"));
        Ok(())
    }

    #[test]
    fn find_artifact_matches_extension_case_insensitively() -> anyhow::Result<()> {
        let staging = TempDir::new()?;
        fs::write(staging.path().join("App.APK"), b"bytes")?;
        assert!(find_artifact(staging.path(), "apk").is_some());
        Ok(())
    }

    #[test]
    fn find_artifact_returns_none_when_absent() -> anyhow::Result<()> {
        let staging = TempDir::new()?;
        fs::write(staging.path().join("main.py"), b"source")?;
        assert!(find_artifact(staging.path(), "apk").is_none());
        Ok(())
    }

    #[test]
    fn install_artifact_copies_into_fresh_output_dir() -> anyhow::Result<()> {
        let staging = TempDir::new()?;
        let source = staging.path().join("app-release.apk");
        fs::write(&source, b"package-bytes")?;
        let output_dir = staging.path().join("out");

        let installed = install_artifact(&source, &output_dir, "Demo.apk")?;
        assert_eq!(installed, output_dir.join("Demo.apk"));
        assert_eq!(fs::read(installed)?, b"package-bytes");
        Ok(())
    }
}
