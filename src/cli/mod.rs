//! Command-line interface for the ALCIS core.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::fragments::ShowArgs;
use commands::init::InitArgs;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "alcis")]
#[command(about = "ALCIS - platform core configuration and diagnostics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "ALCIS_ROOT")]
    pub root: Option<PathBuf>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the config tree and working directories
    Init(InitArgs),

    /// Check secrets and directory permissions
    Validate,

    /// Show the resolved settings with secrets redacted
    Config,

    /// List platform configs, or show one
    Platforms(ShowArgs),

    /// List policy configs, or show one
    Policies(ShowArgs),
}

impl Cli {
    /// Absolute project root for this invocation.
    pub fn project_root(&self) -> anyhow::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd,
        })
    }
}

/// Print a failed command and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
