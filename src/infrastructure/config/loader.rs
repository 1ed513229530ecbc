//! Layered settings resolution with figment.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::Value as FigmentValue;
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::errors::{AlcisError, ConfigurationKind};
use crate::domain::models::settings::Settings;

/// Environment variable names and the settings key each one sets.
///
/// Lookup is case-insensitive; variables not listed here are ignored.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("ENVIRONMENT", "environment"),
    ("DEBUG", "debug"),
    ("DATABASE_URL", "database.url"),
    ("DATABASE_ECHO", "database.echo"),
    ("DATABASE_POOL_SIZE", "database.pool_size"),
    ("DATABASE_MAX_OVERFLOW", "database.max_overflow"),
    ("REDIS_URL", "cache.url"),
    ("REDIS_PASSWORD", "cache.password"),
    ("REDIS_DB", "cache.db"),
    ("SECRET_KEY", "security.secret_key"),
    ("ENCRYPTION_KEY", "security.encryption_key"),
    ("JWT_ALGORITHM", "security.jwt_algorithm"),
    ("JWT_EXPIRATION", "security.jwt_expiration_seconds"),
    ("PASSWORD_HASH_ROUNDS", "security.password_hash_rounds"),
    ("CRAWLER_TIMEOUT", "crawl.timeout_seconds"),
    ("CRAWLER_MAX_RETRIES", "crawl.max_retries"),
    ("CRAWLER_RATE_LIMIT", "crawl.rate_limit_seconds"),
    ("AI_MODEL_NAME", "ai.model_name"),
    ("AI_CONFIDENCE_THRESHOLD", "ai.confidence_threshold"),
    ("AI_MAX_REASONING_STEPS", "ai.max_reasoning_steps"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
    ("LOG_FILE_PATH", "logging.file_path"),
];

/// Settings keys whose values are strings and must not be reinterpreted.
const TEXT_KEYS: [&str; 11] = [
    "environment",
    "database.url",
    "cache.url",
    "cache.password",
    "security.secret_key",
    "security.encryption_key",
    "security.jwt_algorithm",
    "ai.model_name",
    "logging.level",
    "logging.format",
    "logging.file_path",
];

const VALID_LOG_LEVELS: [&str; 7] = [
    "trace", "debug", "info", "warn", "warning", "error", "critical",
];

const VALID_LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Settings key for an environment variable name, if it is a known one.
pub fn settings_key(env_name: &str) -> Option<&'static str> {
    ENV_KEYS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(env_name))
        .map(|(_, key)| *key)
}

fn is_text_key(key: &str) -> bool {
    TEXT_KEYS.iter().any(|text| text.eq_ignore_ascii_case(key))
}

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The merged sources could not be deserialized into [`Settings`].
    #[error("Failed to extract settings: {0}")]
    Extraction(#[from] figment::Error),

    /// `database.pool_size` is zero.
    #[error("Invalid database pool_size: {0}. Must be at least 1")]
    InvalidPoolSize(u32),

    /// `ai.confidence_threshold` lies outside [0, 1].
    #[error("Invalid AI confidence_threshold: {0}. Must be between 0 and 1")]
    InvalidConfidenceThreshold(f64),

    /// `logging.level` is not a known level name.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warning, error, critical")]
    InvalidLogLevel(String),

    /// `logging.format` is neither `text` nor `json`.
    #[error("Invalid log format: {0}. Must be one of: text, json")]
    InvalidLogFormat(String),
}

impl ConfigError {
    /// Dotted settings key the error is about, when known.
    pub fn settings_key(&self) -> Option<String> {
        match self {
            Self::Extraction(e) if e.path.is_empty() => None,
            Self::Extraction(e) => Some(e.path.join(".")),
            Self::InvalidPoolSize(_) => Some("database.pool_size".to_string()),
            Self::InvalidConfidenceThreshold(_) => Some("ai.confidence_threshold".to_string()),
            Self::InvalidLogLevel(_) => Some("logging.level".to_string()),
            Self::InvalidLogFormat(_) => Some("logging.format".to_string()),
        }
    }
}

impl From<ConfigError> for AlcisError {
    fn from(err: ConfigError) -> Self {
        Self::new(ConfigurationKind::Invalid, err.to_string())
            .with_code("INVALID_CONFIGURATION")
    }
}

/// Resolves [`Settings`] from layered sources
///
/// Precedence (lowest to highest):
/// 1. Programmatic defaults (Serialized)
/// 2. `config/settings.yaml` under the project root (optional)
/// 3. `.env` under the project root (optional, never touches the process env)
/// 4. Process environment variables
///
/// Path fields are always derived from the project root.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    project_root: PathBuf,
    settings_file: PathBuf,
    dotenv_file: Option<PathBuf>,
}

impl SettingsResolver {
    /// Resolver reading `config/settings.yaml` and `.env` under `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            settings_file: project_root.join("config").join("settings.yaml"),
            dotenv_file: Some(project_root.join(".env")),
            project_root,
        }
    }

    /// Resolver rooted at the current working directory.
    pub fn from_current_dir() -> std::io::Result<Self> {
        std::env::current_dir().map(Self::new)
    }

    /// Read the YAML layer from `path` instead of `config/settings.yaml`.
    #[must_use]
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = path.into();
        self
    }

    /// Use a different `.env` file, or none.
    #[must_use]
    pub fn with_dotenv_file(mut self, path: Option<PathBuf>) -> Self {
        self.dotenv_file = path;
        self
    }

    /// Project root every path is derived from.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The merged provider stack, before extraction.
    pub fn figment(&self) -> Figment {
        self.layers(true)
    }

    fn layers(&self, include_settings_file: bool) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if include_settings_file {
            figment = figment.merge(Yaml::file(&self.settings_file));
        }

        let figment = self.merge_dotenv(figment);
        Env::raw()
            .filter_map(|name| settings_key(name.as_str()).map(|key| key.to_owned().into()))
            .iter()
            .fold(figment, |figment, (key, raw)| merge_raw(figment, key.as_str(), raw))
    }

    /// Extract and validate settings.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let settings = self.extract(&self.figment())?;
        debug!(
            environment = %settings.environment,
            debug = settings.debug,
            root = %settings.project_root.display(),
            "settings resolved"
        );
        Ok(settings)
    }

    /// Like [`resolve`](Self::resolve), but never fails.
    ///
    /// A key whose value cannot be extracted or validated falls back to its
    /// own default and every other key keeps its resolved value. An
    /// unreadable settings file is dropped as a whole.
    pub fn resolve_or_default(&self) -> Settings {
        let defaults = Figment::from(Serialized::defaults(Settings::default()));
        let mut include_settings_file = true;
        let mut replaced: Vec<String> = Vec::new();

        loop {
            let figment = replaced
                .iter()
                .fold(self.layers(include_settings_file), |figment, key| {
                    match defaults.find_value(key) {
                        Ok(value) => figment.merge(Serialized::default(key, value)),
                        Err(_) => figment,
                    }
                });

            let error = match self.extract(&figment) {
                Ok(settings) => return settings,
                Err(e) => e,
            };

            match error.settings_key() {
                Some(key) if !replaced.contains(&key) && defaults.find_value(&key).is_ok() => {
                    warn!(key = %key, error = %error, "invalid setting, using its default");
                    replaced.push(key);
                }
                _ if include_settings_file => {
                    warn!(
                        path = %self.settings_file.display(),
                        error = %error,
                        "ignoring unusable settings file"
                    );
                    include_settings_file = false;
                }
                _ => {
                    warn!(error = %error, "failed to resolve settings, using defaults");
                    return Settings::default().rooted_at(&self.project_root);
                }
            }
        }
    }

    fn extract(&self, figment: &Figment) -> Result<Settings, ConfigError> {
        let settings: Settings = figment.extract()?;
        Self::validate(&settings)?;
        Ok(settings.rooted_at(&self.project_root))
    }

    /// Validate value ranges after extraction
    pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
        if settings.database.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize(settings.database.pool_size));
        }

        if !(0.0..=1.0).contains(&settings.ai.confidence_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(
                settings.ai.confidence_threshold,
            ));
        }

        let level = settings.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(settings.logging.level.clone()));
        }

        let format = settings.logging.format.to_ascii_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(settings.logging.format.clone()));
        }

        Ok(())
    }

    /// Layer known `.env` entries; an unreadable file is only a warning.
    fn merge_dotenv(&self, mut figment: Figment) -> Figment {
        let Some(path) = &self.dotenv_file else {
            return figment;
        };

        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(e) if e.not_found() => return figment,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read .env file");
                return figment;
            }
        };

        for entry in entries {
            match entry {
                Ok((name, raw)) => {
                    if let Some(key) = settings_key(&name) {
                        figment = merge_raw(figment, key, raw);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed .env entry");
                }
            }
        }

        figment
    }
}

/// Layer one textual override. Text keys keep the exact characters given;
/// other keys are parsed into typed values (numbers, booleans).
fn merge_raw(figment: Figment, key: &str, raw: String) -> Figment {
    let value = if is_text_key(key) {
        FigmentValue::from(raw)
    } else {
        raw.parse::<FigmentValue>()
            .unwrap_or_else(|_| FigmentValue::from(raw.clone()))
    };
    figment.merge(Serialized::default(key, value))
}
