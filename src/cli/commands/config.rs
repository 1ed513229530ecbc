//! Implementation of the `alcis config` command.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::domain::models::settings::{redact, Settings};
use crate::infrastructure::config::SettingsResolver;

/// Result of `alcis config`.
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    /// Resolved project root.
    pub project_root: String,
    /// Resolved data directory.
    pub data_dir: String,
    /// Resolved logs directory.
    pub logs_dir: String,
    /// Settings tree with secrets replaced by placeholders.
    pub settings: Value,
}

impl ConfigOutput {
    /// Snapshot `settings` with every secret redacted.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut value = serde_json::to_value(settings).context("Failed to serialize settings")?;

        if let Some(security) = value.get_mut("security").and_then(Value::as_object_mut) {
            security.insert(
                "secret_key".into(),
                redact(&settings.security.secret_key).into(),
            );
            security.insert(
                "encryption_key".into(),
                redact(&settings.security.encryption_key).into(),
            );
        }
        if let Some(cache) = value.get_mut("cache").and_then(Value::as_object_mut) {
            if let Some(password) = &settings.cache.password {
                cache.insert("password".into(), redact(password).into());
            }
        }

        Ok(Self {
            project_root: settings.project_root.display().to_string(),
            data_dir: settings.data_dir.display().to_string(),
            logs_dir: settings.logs_dir.display().to_string(),
            settings: value,
        })
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        let mut rows = Vec::new();
        flatten("", &self.settings, &mut rows);

        let mut table = table(&["Setting", "Value"]);
        table.add_row(vec!["project_root".to_string(), self.project_root.clone()]);
        table.add_row(vec!["data_dir".to_string(), self.data_dir.clone()]);
        table.add_row(vec!["logs_dir".to_string(), self.logs_dir.clone()]);
        for (key, value) in rows {
            table.add_row(vec![key, truncate(&value, 80)]);
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Dotted-key rows for every scalar leaf; sequences are shown inline.
fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, rows);
            }
        }
        Value::String(s) => rows.push((prefix.to_string(), s.clone())),
        Value::Null => rows.push((prefix.to_string(), "-".to_string())),
        other => rows.push((prefix.to_string(), other.to_string())),
    }
}

/// Run `alcis config`.
pub fn execute(project_root: &Path, json_mode: bool) -> Result<()> {
    let settings = SettingsResolver::new(project_root)
        .resolve()
        .context("Failed to resolve settings")?;
    output(&ConfigOutput::from_settings(&settings)?, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_redacted() {
        let mut settings = Settings::default().rooted_at("/srv/alcis");
        settings.security.secret_key = "super-secret".to_string();
        settings.cache.password = Some("hunter2".to_string());

        let out = ConfigOutput::from_settings(&settings).unwrap();
        let rendered = out.to_json().to_string();

        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(out.settings["security"]["secret_key"], "[REDACTED]");
        assert_eq!(out.settings["security"]["encryption_key"], "<unset>");
        assert_eq!(out.logs_dir, "/srv/alcis/logs");
    }

    #[test]
    fn test_human_output_lists_dotted_keys() {
        let settings = Settings::default().rooted_at("/srv/alcis");
        let human = ConfigOutput::from_settings(&settings).unwrap().to_human();

        assert!(human.contains("database.pool_size"));
        assert!(human.contains("ai.model_name"));
        assert!(human.contains("distilbert-base-uncased"));
    }
}
