//! Channel descriptors and the default channel set.

use std::path::{Path, PathBuf};
use tracing::Level;

use crate::domain::models::settings::Settings;

/// Size cap of every channel file before rotation (10 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated backups kept per channel
pub const DEFAULT_BACKUP_COUNT: u32 = 5;

/// Structured sibling of the `security` channel
pub const AUDIT_JSON_FILE: &str = "security_audit.jsonl";

/// Channels installed at startup: name, file under the logs directory, minimum level.
pub const DEFAULT_CHANNELS: [(&str, &str, Level); 5] = [
    ("main", "alcis.log", Level::INFO),
    ("security", "security.log", Level::WARN),
    ("auth", "auth.log", Level::INFO),
    ("ai", "ai_decisions.log", Level::INFO),
    ("error", "errors.log", Level::ERROR),
];

/// Sink descriptor for one log channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Log file; parent directories are created on first write.
    pub file_path: PathBuf,
    /// Minimum level written; lower levels are dropped.
    pub level: Level,
    /// Size cap of the live file in bytes.
    pub max_bytes: u64,
    /// Numbered backups kept; 0 disables rotation.
    pub backup_count: u32,
    /// Mirror every entry to stderr at the same level
    pub mirror_to_console: bool,
}

impl ChannelConfig {
    /// Descriptor with the default rotation and no console mirror.
    pub fn new(file_path: impl Into<PathBuf>, level: Level) -> Self {
        Self {
            file_path: file_path.into(),
            level,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            mirror_to_console: false,
        }
    }

    /// Override the size cap and backup count.
    #[must_use]
    pub const fn with_rotation(mut self, max_bytes: u64, backup_count: u32) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    /// Also write entries to stderr.
    #[must_use]
    pub const fn with_console(mut self, mirror: bool) -> Self {
        self.mirror_to_console = mirror;
        self
    }
}

/// Router-wide settings from which channel descriptors are derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Directory holding every default channel file.
    pub logs_dir: PathBuf,
    /// Override for the `main` channel's file
    pub main_file: Option<PathBuf>,
    /// Mirror every channel to stderr.
    pub mirror_to_console: bool,
}

impl RouterConfig {
    /// Router config rooted at `logs_dir` with no overrides.
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            main_file: None,
            mirror_to_console: false,
        }
    }

    /// Derive from resolved settings. A relative `LOG_FILE_PATH` is taken
    /// relative to the project root.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            logs_dir: settings.logs_dir.clone(),
            main_file: settings
                .logging
                .file_path
                .as_deref()
                .filter(|path| !path.trim().is_empty())
                .map(|path| settings.project_root.join(path)),
            mirror_to_console: settings.debug,
        }
    }

    /// Descriptor used for a channel that was never configured explicitly.
    pub fn channel_defaults(&self, name: &str) -> ChannelConfig {
        ChannelConfig::new(self.logs_dir.join(default_file_name(name)), Level::INFO)
            .with_console(self.mirror_to_console)
    }

    /// Descriptors for the fixed startup channel set.
    pub fn default_channels(&self) -> Vec<(&'static str, ChannelConfig)> {
        DEFAULT_CHANNELS
            .iter()
            .map(|&(name, file, level)| {
                let path = match (name, &self.main_file) {
                    ("main", Some(path)) => path.clone(),
                    _ => self.logs_dir.join(file),
                };
                let config = ChannelConfig::new(path, level).with_console(self.mirror_to_console);
                (name, config)
            })
            .collect()
    }

    /// Path of the JSON-lines audit sibling.
    pub fn audit_json_path(&self) -> PathBuf {
        self.logs_dir.join(AUDIT_JSON_FILE)
    }

    /// Directory holding the default channel files.
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }
}

/// `crawler.linkedin` -> `crawler_linkedin.log`
pub fn default_file_name(channel: &str) -> String {
    format!("{}.log", channel.replace('.', "_"))
}
