//! Configuration composition root
//!
//! Owns the resolved [`Settings`] and the [`FragmentConfigStore`] and answers
//! the health question "is this installation usable?".

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, warn};

use super::fragments::{FragmentConfigStore, LoadReport};
use crate::domain::models::fragment::{FragmentDocument, FragmentNamespace};
use crate::domain::models::settings::Settings;

/// Working directories created under the project root.
pub const BOOTSTRAP_DIRS: [&str; 5] = ["data", "logs", "sessions", "cache", "temp"];

/// Owns the resolved settings and the fragment store for one project root.
#[derive(Debug)]
pub struct ConfigManager {
    settings: Arc<Settings>,
    fragments: FragmentConfigStore,
}

impl ConfigManager {
    /// Build the manager and load every fragment under the settings' config directory.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self::open(settings).0
    }

    /// Like [`new`](Self::new), also returning the report of the initial load.
    pub fn open(settings: Arc<Settings>) -> (Self, LoadReport) {
        let (fragments, report) = FragmentConfigStore::open(settings.config_dir());
        if !report.skipped.is_empty() {
            warn!(
                skipped = report.skipped.len(),
                "some fragment configs could not be loaded"
            );
        }
        (
            Self {
                settings,
                fragments,
            },
            report,
        )
    }

    /// Resolved settings.
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Directory holding `platforms/` and `policies/`.
    pub fn config_dir(&self) -> &Path {
        self.fragments.config_dir()
    }

    /// Absolute paths of the bootstrap directories, in creation order.
    pub fn bootstrap_paths(&self) -> Vec<PathBuf> {
        BOOTSTRAP_DIRS
            .iter()
            .map(|dir| match *dir {
                "data" => self.settings.data_dir.clone(),
                "logs" => self.settings.logs_dir.clone(),
                other => self.settings.project_root.join(other),
            })
            .collect()
    }

    /// Create the working directories if absent. Safe to call repeatedly.
    pub fn bootstrap_directories(&self) -> std::io::Result<Vec<PathBuf>> {
        let paths = self.bootstrap_paths();
        for path in &paths {
            fs::create_dir_all(path)?;
            debug!(path = %path.display(), "directory ready");
        }
        Ok(paths)
    }

    /// True when both secrets are set and the data and logs directories are writable.
    pub fn validate(&self) -> bool {
        let missing = self.settings.security.missing_secrets();
        if !missing.is_empty() {
            warn!(missing = ?missing, "required security settings are empty");
            return false;
        }

        [&self.settings.data_dir, &self.settings.logs_dir]
            .into_iter()
            .all(|dir| match check_writable(dir) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "directory is not writable");
                    false
                }
            })
    }

    /// Platform fragment named `name`.
    pub fn get_platform_config(&self, name: &str) -> Option<Arc<FragmentDocument>> {
        self.fragments.get(FragmentNamespace::Platform, name)
    }

    /// Policy fragment named `name`.
    pub fn get_policy_config(&self, name: &str) -> Option<Arc<FragmentDocument>> {
        self.fragments.get(FragmentNamespace::Policy, name)
    }

    /// Copy of every platform fragment, keyed by name.
    pub fn get_all_platforms(&self) -> BTreeMap<String, FragmentDocument> {
        self.fragments.all(FragmentNamespace::Platform)
    }

    /// Copy of every policy fragment, keyed by name.
    pub fn get_all_policies(&self) -> BTreeMap<String, FragmentDocument> {
        self.fragments.all(FragmentNamespace::Policy)
    }

    /// Underlying fragment store.
    pub fn fragments(&self) -> &FragmentConfigStore {
        &self.fragments
    }

    /// Rescan both fragment directories and swap the result in.
    pub fn reload_configs(&self) -> LoadReport {
        self.fragments.reload()
    }
}

fn check_writable(dir: &Path) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "directory does not exist",
        ));
    }

    let marker = dir.join(format!(".alcis-write-check-{}", process::id()));
    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&marker)
        .and_then(|mut file| file.write_all(b"ok"));
    let _ = fs::remove_file(&marker);
    result
}
