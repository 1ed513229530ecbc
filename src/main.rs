//! ALCIS CLI entry point.

use clap::Parser;

use alcis::cli::{handle_error, Cli, Commands};
use alcis::domain::models::fragment::FragmentNamespace;
use alcis::domain::models::settings::LoggingSettings;
use alcis::infrastructure::logging::init_diagnostics;

fn main() {
    let cli = Cli::parse();

    let result = cli.project_root().and_then(|root| {
        init_diagnostics(&diagnostic_settings());

        match &cli.command {
            Commands::Init(args) => alcis::cli::commands::init::execute(args, &root, cli.json),
            Commands::Validate => alcis::cli::commands::validate::execute(&root, cli.json),
            Commands::Config => alcis::cli::commands::config::execute(&root, cli.json),
            Commands::Platforms(args) => alcis::cli::commands::fragments::execute(
                FragmentNamespace::Platform,
                args,
                &root,
                cli.json,
            ),
            Commands::Policies(args) => alcis::cli::commands::fragments::execute(
                FragmentNamespace::Policy,
                args,
                &root,
                cli.json,
            ),
        }
    });

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

/// Diagnostics follow `LOG_LEVEL`/`LOG_FORMAT` but stay quiet by default so
/// command output is not interleaved with startup chatter.
fn diagnostic_settings() -> LoggingSettings {
    LoggingSettings {
        level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        file_path: None,
    }
}
