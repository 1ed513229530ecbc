//! Implementation of the `alcis validate` command.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ConfigManager, SettingsResolver};

/// Result of `alcis validate`.
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    /// Overall verdict.
    pub valid: bool,
    /// Environment the settings resolved for.
    pub environment: String,
    /// Required secrets that are empty.
    pub missing_secrets: Vec<String>,
    /// Other problems, such as settings errors or missing directories.
    pub issues: Vec<String>,
    /// Fragment files that could not be loaded.
    pub skipped_fragments: Vec<String>,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![if self.valid {
            format!("Configuration is valid (environment: {}).", self.environment)
        } else {
            format!("Configuration is NOT valid (environment: {}).", self.environment)
        }];
        for secret in &self.missing_secrets {
            lines.push(format!("  - missing secret: {secret}"));
        }
        for issue in &self.issues {
            lines.push(format!("  - {issue}"));
        }
        for skipped in &self.skipped_fragments {
            lines.push(format!("  - skipped fragment: {skipped}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run `alcis validate`; fails when the configuration is not usable.
pub fn execute(project_root: &Path, json_mode: bool) -> Result<()> {
    let resolver = SettingsResolver::new(project_root);
    let mut issues = Vec::new();

    let settings = match resolver.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            issues.push(e.to_string());
            resolver.resolve_or_default()
        }
    };

    let (manager, report) = ConfigManager::open(Arc::new(settings));
    let settings = manager.settings();
    let missing_secrets: Vec<String> = settings
        .security
        .missing_secrets()
        .into_iter()
        .map(str::to_owned)
        .collect();

    for dir in [&settings.data_dir, &settings.logs_dir] {
        if !dir.is_dir() {
            issues.push(format!("directory missing: {} (run `alcis init`)", dir.display()));
        }
    }

    let skipped_fragments = report
        .skipped
        .iter()
        .map(|skipped| format!("{} ({})", skipped.path.display(), skipped.reason))
        .collect();

    let valid = manager.validate() && issues.is_empty();
    let output_data = ValidateOutput {
        valid,
        environment: settings.environment.clone(),
        missing_secrets,
        issues,
        skipped_fragments,
    };
    output(&output_data, json_mode);

    if !valid {
        bail!("configuration validation failed");
    }
    Ok(())
}
