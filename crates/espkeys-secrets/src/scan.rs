//! Device configuration discovery
//!
//! Produces an explicit, lexicographically sorted list of config files
//! before any processing begins, so iteration order is a first-class,
//! reproducible input rather than an accident of filesystem layout.

use espkeys_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File extensions recognized as device configurations
pub const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Recursively enumerate device config files under the scan root, sorted by path
pub fn scan_devices(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::input(format!(
            "scan root not found or not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry
            .map_err(|e| Error::input(format!("failed to walk {}: {}", root.display(), e)))?;

        if entry.file_type().is_file() && is_config_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();

    if files.is_empty() {
        return Err(Error::input(format!(
            "no device configurations (*.yml, *.yaml) found under {}",
            root.display()
        )));
    }

    debug!("Found {} device config(s) under {}", files.len(), root.display());
    Ok(files)
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONFIG_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_is_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("zulu.yaml"), "").unwrap();
        std::fs::write(temp_dir.path().join("alpha.yml"), "").unwrap();
        std::fs::write(temp_dir.path().join("nested/mid.yaml"), "").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let files = scan_devices(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("alpha.yml"),
                PathBuf::from("nested/mid.yaml"),
                PathBuf::from("zulu.yaml"),
            ]
        );
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("device.YAML"), "").unwrap();

        let files = scan_devices(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root_is_input_error() {
        let err = scan_devices(Path::new("/nonexistent/devices")).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_tree_is_input_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("readme.md"), "").unwrap();

        let err = scan_devices(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("no device configurations"));
    }
}
