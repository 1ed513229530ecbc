//! Implementation of the `alcis platforms` and `alcis policies` commands.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::domain::models::fragment::{FragmentDocument, FragmentNamespace};
use crate::infrastructure::config::{FragmentConfigStore, SettingsResolver};

/// Arguments for `alcis platforms` and `alcis policies`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Fragment name (file stem); lists all fragments when omitted
    pub name: Option<String>,
}

/// Listing of one fragment namespace.
#[derive(Debug, Serialize)]
pub struct FragmentListOutput {
    /// Namespace the file belongs to.
    pub namespace: FragmentNamespace,
    /// Loaded fragments, sorted by name.
    pub fragments: Vec<FragmentSummary>,
    /// Skipped files with reasons.
    pub skipped: Vec<String>,
}

/// One row of a fragment listing.
#[derive(Debug, Serialize)]
pub struct FragmentSummary {
    /// Fragment name (file stem).
    pub name: String,
    /// Top-level keys, in file order.
    pub keys: Vec<String>,
}

impl CommandOutput for FragmentListOutput {
    fn to_human(&self) -> String {
        if self.fragments.is_empty() {
            return format!("No {} configs found.", self.namespace);
        }

        let mut table = table(&["Name", "Keys"]);
        for fragment in &self.fragments {
            table.add_row(vec![
                fragment.name.clone(),
                truncate(&fragment.keys.join(", "), 60),
            ]);
        }

        let mut lines = vec![table.to_string()];
        for skipped in &self.skipped {
            lines.push(format!("skipped: {skipped}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// A single fragment document.
#[derive(Debug, Serialize)]
pub struct FragmentShowOutput {
    /// Namespace the file belongs to.
    pub namespace: FragmentNamespace,
    /// Fragment name (file stem).
    pub name: String,
    /// Parsed document.
    pub document: FragmentDocument,
}

impl CommandOutput for FragmentShowOutput {
    fn to_human(&self) -> String {
        let body = serde_yaml::to_string(&Value::Object(self.document.clone()))
            .unwrap_or_else(|e| format!("<unrenderable: {e}>"));
        format!("# {} {}\n{}", self.namespace, self.name, body.trim_end())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// List the fragments of `namespace`, or show the one named in `args`.
pub fn execute(
    namespace: FragmentNamespace,
    args: &ShowArgs,
    project_root: &Path,
    json_mode: bool,
) -> Result<()> {
    let settings = SettingsResolver::new(project_root).resolve_or_default();
    let (store, report) = FragmentConfigStore::open(settings.config_dir());

    match &args.name {
        Some(name) => {
            let Some(document) = store.get(namespace, name) else {
                bail!("{namespace} config '{name}' not found");
            };
            output(
                &FragmentShowOutput {
                    namespace,
                    name: name.clone(),
                    document: Arc::unwrap_or_clone(document),
                },
                json_mode,
            );
        }
        None => {
            let fragments = store
                .all(namespace)
                .into_iter()
                .map(|(name, document)| FragmentSummary {
                    name,
                    keys: document.keys().cloned().collect(),
                })
                .collect();
            let skipped = report
                .skipped
                .iter()
                .filter(|skipped| skipped.namespace == namespace)
                .map(|skipped| format!("{} ({})", skipped.path.display(), skipped.reason))
                .collect();
            output(
                &FragmentListOutput {
                    namespace,
                    fragments,
                    skipped,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
