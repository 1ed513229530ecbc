//! Implementation of the `alcis init` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::{ConfigManager, SettingsResolver};
use crate::infrastructure::setup::initialize_project;

/// Arguments for `alcis init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config/settings.yaml with the template
    #[arg(long, short)]
    pub force: bool,
}

/// Result of `alcis init`.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    /// Always true; failures exit through the error path.
    pub success: bool,
    /// Summary line.
    pub message: String,
    /// Project root that was initialized.
    pub initialized_path: PathBuf,
    /// Directories ensured, relative to the project root.
    pub directories: Vec<String>,
    /// Whether `config/settings.yaml` was (re)written.
    pub settings_file_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories.is_empty() {
            lines.push("\nDirectories:".to_string());
            for dir in &self.directories {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.settings_file_written {
            lines.push("\nWrote config/settings.yaml".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run `alcis init` under `project_root`.
pub fn execute(args: &InitArgs, project_root: &Path, json_mode: bool) -> Result<()> {
    let report = initialize_project(project_root, args.force)?;

    let settings = SettingsResolver::new(project_root).resolve_or_default();
    let manager = ConfigManager::new(Arc::new(settings));
    let working_dirs = manager
        .bootstrap_directories()
        .context("Failed to create working directories")?;

    let directories = report
        .directories
        .iter()
        .chain(&working_dirs)
        .map(|dir| {
            dir.strip_prefix(project_root)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string()
        })
        .collect();

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: project_root.to_path_buf(),
        directories,
        settings_file_written: report.settings_file.is_some(),
    };
    output(&output_data, json_mode);
    Ok(())
}
