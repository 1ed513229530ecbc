//! Process-wide diagnostic subscriber.

use anyhow::Result;
use std::io;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::settings::LoggingSettings;

/// Level used when the configured one is not recognised.
pub const FALLBACK_LEVEL: Level = Level::WARN;

/// Install the process-wide diagnostic subscriber on stderr.
///
/// `RUST_LOG` refines the configured level. An unknown level name falls back
/// to [`FALLBACK_LEVEL`] and is reported once the subscriber is up. Returns
/// `false` when a global subscriber was already installed, which is not an
/// error.
pub fn init_diagnostics(settings: &LoggingSettings) -> bool {
    let (default_level, rejected) = level_or_fallback(&settings.level);

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();

    let layer = if settings.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_target(true)
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    };

    let installed = tracing_subscriber::registry().with(layer).try_init().is_ok();
    if let Some(e) = rejected {
        tracing::warn!(error = %e, fallback = %FALLBACK_LEVEL, "ignoring configured log level");
    }
    if installed {
        tracing::debug!(
            level = %settings.level,
            format = %settings.format,
            "diagnostics initialized"
        );
    }
    installed
}

fn level_or_fallback(level: &str) -> (Level, Option<anyhow::Error>) {
    match parse_log_level(level) {
        Ok(level) => (level, None),
        Err(e) => (FALLBACK_LEVEL, Some(e)),
    }
}

/// Parse a level name; `warning` and `critical` are accepted aliases.
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "critical" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
