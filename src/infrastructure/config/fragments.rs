//! Directory-scoped configuration fragments
//!
//! Platform and policy definitions live one-per-file under
//! `config/platforms/` and `config/policies/`. The file stem is the lookup
//! key. A reload builds a complete replacement set before swapping it in, so
//! readers see either the old set or the new one.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::models::fragment::{FragmentDocument, FragmentNamespace};

const FRAGMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Why a single fragment file could not be loaded
#[derive(Error, Debug)]
pub enum FragmentError {
    /// The file could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but is not a mapping.
    #[error("top-level document must be a mapping, found {0}")]
    NotAMapping(&'static str),

    /// Another file with the same stem was loaded first.
    #[error("duplicate fragment name '{0}'")]
    Duplicate(String),
}

/// A file that was skipped during a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFragment {
    /// Namespace the file belongs to.
    pub namespace: FragmentNamespace,
    /// File that was skipped.
    pub path: PathBuf,
    /// Human-readable cause, from [`FragmentError`].
    pub reason: String,
}

/// Outcome of one load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Platform fragments loaded.
    pub platforms: usize,
    /// Policy fragments loaded.
    pub policies: usize,
    /// Files that were not loaded, with reasons.
    pub skipped: Vec<SkippedFragment>,
}

impl LoadReport {
    /// Fragments loaded across both namespaces.
    pub fn loaded(&self) -> usize {
        self.platforms + self.policies
    }
}

type FragmentMap = HashMap<String, Arc<FragmentDocument>>;

#[derive(Debug, Default)]
struct FragmentSet {
    platforms: FragmentMap,
    policies: FragmentMap,
}

impl FragmentSet {
    const fn namespace(&self, namespace: FragmentNamespace) -> &FragmentMap {
        match namespace {
            FragmentNamespace::Platform => &self.platforms,
            FragmentNamespace::Policy => &self.policies,
        }
    }
}

/// Store of platform and policy fragments
#[derive(Debug)]
pub struct FragmentConfigStore {
    config_dir: PathBuf,
    current: RwLock<Arc<FragmentSet>>,
    /// Held across scan and swap so loads apply in the order they ran.
    loading: Mutex<()>,
}

impl FragmentConfigStore {
    /// Empty store reading from `config_dir`; call [`load`](Self::load) to fill it.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            current: RwLock::new(Arc::new(FragmentSet::default())),
            loading: Mutex::new(()),
        }
    }

    /// Create a store and load it immediately.
    pub fn open(config_dir: impl Into<PathBuf>) -> (Self, LoadReport) {
        let store = Self::new(config_dir);
        let report = store.load();
        (store, report)
    }

    /// Directory the namespaces live under.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Directory scanned for `namespace`.
    pub fn namespace_dir(&self, namespace: FragmentNamespace) -> PathBuf {
        self.config_dir.join(namespace.dir_name())
    }

    /// Scan both namespace directories and replace the current set.
    ///
    /// Malformed files are skipped and reported; missing directories
    /// contribute nothing. Never fails as a whole.
    pub fn load(&self) -> LoadReport {
        let _loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);

        let mut skipped = Vec::new();
        let platforms = self.scan(FragmentNamespace::Platform, &mut skipped);
        let policies = self.scan(FragmentNamespace::Policy, &mut skipped);

        let report = LoadReport {
            platforms: platforms.len(),
            policies: policies.len(),
            skipped,
        };

        let replacement = Arc::new(FragmentSet {
            platforms,
            policies,
        });
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = replacement;

        info!(
            platforms = report.platforms,
            policies = report.policies,
            skipped = report.skipped.len(),
            "fragment configs loaded"
        );
        report
    }

    /// Discard everything and load again from disk.
    pub fn reload(&self) -> LoadReport {
        debug!(config_dir = %self.config_dir.display(), "reloading fragment configs");
        self.load()
    }

    /// Fragment `name` in `namespace`, if loaded.
    pub fn get(&self, namespace: FragmentNamespace, name: &str) -> Option<Arc<FragmentDocument>> {
        self.snapshot().namespace(namespace).get(name).cloned()
    }

    /// Deep copy of every fragment in `namespace`.
    pub fn all(&self, namespace: FragmentNamespace) -> BTreeMap<String, FragmentDocument> {
        self.snapshot()
            .namespace(namespace)
            .iter()
            .map(|(name, doc)| (name.clone(), doc.as_ref().clone()))
            .collect()
    }

    /// Sorted fragment names in `namespace`.
    pub fn names(&self, namespace: FragmentNamespace) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().namespace(namespace).keys().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self) -> Arc<FragmentSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn scan(&self, namespace: FragmentNamespace, skipped: &mut Vec<SkippedFragment>) -> FragmentMap {
        let dir = self.namespace_dir(namespace);
        let mut fragments = FragmentMap::new();

        if !dir.is_dir() {
            debug!(namespace = %namespace, path = %dir.display(), "fragment directory absent");
            return fragments;
        }

        let mut paths: Vec<PathBuf> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && has_fragment_extension(path))
                .collect(),
            Err(e) => {
                warn!(namespace = %namespace, path = %dir.display(), error = %e, "failed to read fragment directory");
                skipped.push(SkippedFragment {
                    namespace,
                    path: dir,
                    reason: e.to_string(),
                });
                return fragments;
            }
        };
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_owned) else {
                continue;
            };

            let result = if fragments.contains_key(&name) {
                Err(FragmentError::Duplicate(name.clone()))
            } else {
                parse_fragment(&path)
            };

            match result {
                Ok(document) => {
                    fragments.insert(name, Arc::new(document));
                }
                Err(e) => {
                    warn!(
                        namespace = %namespace,
                        path = %path.display(),
                        error = %e,
                        "failed to load fragment config"
                    );
                    skipped.push(SkippedFragment {
                        namespace,
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        fragments
    }
}

fn has_fragment_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FRAGMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Parse one fragment file into a mapping document.
pub fn parse_fragment(path: &Path) -> Result<FragmentDocument, FragmentError> {
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let value: serde_json::Value = if is_json {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Err(FragmentError::NotAMapping("an empty document")),
        serde_json::Value::Array(_) => Err(FragmentError::NotAMapping("a sequence")),
        _ => Err(FragmentError::NotAMapping("a scalar")),
    }
}
