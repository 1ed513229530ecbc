//! Named log channels
//!
//! Every channel owns an isolated `tracing` dispatcher: a registry with a
//! rotating file layer and, in debug mode, a stderr mirror. Entries written
//! through a channel never reach the process-wide diagnostic subscriber.

use chrono::Local;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{debug, Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::config::{ChannelConfig, RouterConfig};
use super::rotation::RotatingFileWriter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Errors raised while preparing the log directory
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Upper-case level name used in channel files.
pub fn level_label(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        _ => "ERROR",
    }
}

/// `timestamp - channel - LEVEL - message`
#[derive(Debug, Clone)]
struct ChannelFormat {
    channel: String,
}

impl<S, N> FormatEvent<S, N> for ChannelFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            self.channel,
            level_label(*event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// One named, level-filtered, rotating log sink
pub struct LogChannel {
    name: String,
    config: ChannelConfig,
    dispatch: Dispatch,
}

impl fmt::Debug for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogChannel")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LogChannel {
    /// Build a channel writing to `config.file_path`. The file is opened on first write.
    pub fn new(name: impl Into<String>, config: ChannelConfig) -> Self {
        let name = name.into();
        let filter = LevelFilter::from_level(config.level);

        let writer = RotatingFileWriter::new(
            config.file_path.clone(),
            config.max_bytes,
            config.backup_count,
        );
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(ChannelFormat {
                channel: name.clone(),
            })
            .with_writer(Mutex::new(writer))
            .with_ansi(false)
            .with_filter(filter);

        let console_layer = config.mirror_to_console.then(|| {
            tracing_subscriber::fmt::layer()
                .event_format(ChannelFormat {
                    channel: name.clone(),
                })
                .with_writer(io::stderr)
                .with_filter(filter)
        });

        let subscriber = tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer);

        Self {
            name,
            config,
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor this channel was built from.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// File this channel writes to.
    pub fn file_path(&self) -> &Path {
        &self.config.file_path
    }

    /// Whether an entry at `level` passes this channel's filter.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.config.level
    }

    /// Write one entry. Sink failures are swallowed by the file layer.
    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            Level::TRACE => tracing::event!(target: "alcis", Level::TRACE, "{}", message),
            Level::DEBUG => tracing::event!(target: "alcis", Level::DEBUG, "{}", message),
            Level::INFO => tracing::event!(target: "alcis", Level::INFO, "{}", message),
            Level::WARN => tracing::event!(target: "alcis", Level::WARN, "{}", message),
            _ => tracing::event!(target: "alcis", Level::ERROR, "{}", message),
        });
    }

    /// Write `message` at DEBUG.
    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    /// Write `message` at INFO.
    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    /// Write `message` at WARN.
    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    /// Write `message` at ERROR.
    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Registry of named channels
///
/// Channels are created on first reference and live as long as the router.
#[derive(Debug)]
pub struct ChannelLogRouter {
    config: RouterConfig,
    channels: RwLock<HashMap<String, Arc<LogChannel>>>,
}

impl ChannelLogRouter {
    /// Create the logs directory and install the default channel set.
    pub fn new(config: RouterConfig) -> Result<Self, LoggingError> {
        std::fs::create_dir_all(&config.logs_dir).map_err(|source| LoggingError::CreateDir {
            path: config.logs_dir.display().to_string(),
            source,
        })?;

        let router = Self {
            config,
            channels: RwLock::new(HashMap::new()),
        };
        router.install_defaults();
        Ok(router)
    }

    /// Router-wide settings.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// (Re)install the default channels, replacing any existing sinks.
    pub fn install_defaults(&self) {
        for (name, config) in self.config.default_channels() {
            self.configure(name, config);
        }
    }

    /// Bind `name` to a fresh sink, replacing any previous one.
    pub fn configure(&self, name: &str, config: ChannelConfig) -> Arc<LogChannel> {
        let channel = Arc::new(LogChannel::new(name, config));
        let previous = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&channel));

        debug!(
            channel = name,
            path = %channel.file_path().display(),
            replaced = previous.is_some(),
            "log channel configured"
        );
        channel
    }

    /// Sink for `name`, created with default parameters on first use.
    pub fn resolve(&self, name: &str) -> Arc<LogChannel> {
        if let Some(channel) = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(channel);
        }

        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let channel = channels.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = name, "creating log channel on first use");
            Arc::new(LogChannel::new(name, self.config.channel_defaults(name)))
        });
        Arc::clone(channel)
    }

    /// Registered channel names, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn router(temp: &TempDir) -> ChannelLogRouter {
        ChannelLogRouter::new(RouterConfig::new(temp.path().join("logs"))).unwrap()
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_default_channels_installed() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        assert_eq!(
            router.channel_names(),
            vec!["ai", "auth", "error", "main", "security"]
        );
        assert!(temp.path().join("logs").is_dir());
    }

    #[test]
    fn test_line_format() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        router.resolve("main").info("service started");

        let written = lines(&temp.path().join("logs/alcis.log"));
        assert_eq!(written.len(), 1);

        let parts: Vec<&str> = written[0].splitn(4, " - ").collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), "2024-01-01 00:00:00,000".len());
        assert_eq!(parts[1], "main");
        assert_eq!(parts[2], "INFO");
        assert_eq!(parts[3], "service started");
    }

    #[test]
    fn test_channel_level_filters_entries() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);
        let security = router.resolve("security");

        security.info("routine check");
        security.warn("suspicious login");
        security.error("credential store tampered");

        let written = lines(&temp.path().join("logs/security.log"));
        assert_eq!(written.len(), 2);
        assert!(written[0].contains(" - security - WARNING - suspicious login"));
        assert!(written[1].contains(" - security - ERROR - "));
    }

    #[test]
    fn test_resolve_returns_same_instance() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        let first = router.resolve("custom");
        let second = router.resolve("custom");
        assert!(Arc::ptr_eq(&first, &second));

        second.info("only once");
        assert_eq!(lines(&temp.path().join("logs/custom.log")).len(), 1);
    }

    #[test]
    fn test_unknown_channel_file_name() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        let channel = router.resolve("crawler.linkedin");
        channel.info("page loaded");

        assert_eq!(channel.config().level, Level::INFO);
        assert!(temp.path().join("logs/crawler_linkedin.log").exists());
    }

    #[test]
    fn test_reinstalling_defaults_does_not_duplicate_writes() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        router.install_defaults();
        router.install_defaults();
        router.resolve("auth").info("login ok");

        assert_eq!(lines(&temp.path().join("logs/auth.log")).len(), 1);
    }

    #[test]
    fn test_configure_replaces_existing_channel() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);
        let original = router.resolve("ai");

        let replacement = router.configure(
            "ai",
            ChannelConfig::new(temp.path().join("logs/ai_debug.log"), Level::DEBUG),
        );

        assert!(!Arc::ptr_eq(&original, &replacement));
        assert!(Arc::ptr_eq(&replacement, &router.resolve("ai")));

        router.resolve("ai").debug("token scores computed");
        assert_eq!(lines(&temp.path().join("logs/ai_debug.log")).len(), 1);
        assert!(lines(&temp.path().join("logs/ai_decisions.log")).is_empty());
    }

    #[test]
    fn test_channels_are_isolated() {
        let temp = TempDir::new().unwrap();
        let router = router(&temp);

        router.resolve("auth").info("auth only");

        assert!(lines(&temp.path().join("logs/alcis.log")).is_empty());
        assert_eq!(lines(&temp.path().join("logs/auth.log")).len(), 1);
    }

    #[test]
    fn test_concurrent_resolve_creates_one_channel() {
        let temp = TempDir::new().unwrap();
        let router = Arc::new(router(&temp));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let router = Arc::clone(&router);
                thread::spawn(move || {
                    let channel = router.resolve("workers");
                    channel.info(&format!("worker {i} ready"));
                    channel
                })
            })
            .collect();
        let channels: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(channels.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(lines(&temp.path().join("logs/workers.log")).len(), 8);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(level_label(Level::WARN), "WARNING");
        assert_eq!(level_label(Level::ERROR), "ERROR");
        assert_eq!(level_label(Level::TRACE), "TRACE");
    }
}
