//! Common test utilities for integration tests
//!
//! Project-tree fixtures and environment isolation shared across the
//! integration test files.

#![allow(dead_code)]

use alcis::infrastructure::config::loader::ENV_KEYS;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary project root
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_project() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write `contents` to `relative` under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Run `f` with every recognised settings variable unset except `vars`.
pub fn with_settings_env<R>(vars: &[(&'static str, &'static str)], f: impl FnOnce() -> R) -> R {
    let mut all: Vec<(&str, Option<&str>)> =
        ENV_KEYS.iter().map(|(name, _)| (*name, None)).collect();
    for &(name, value) in vars {
        all.retain(|(n, _)| *n != name);
        all.push((name, Some(value)));
    }
    temp_env::with_vars(all, f)
}

/// Non-empty lines of a text file, or none when it does not exist.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
