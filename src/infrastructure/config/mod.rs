//! Configuration management infrastructure
//!
//! - Layered settings resolution with figment (defaults, YAML, .env, environment)
//! - Platform and policy fragment loading with atomic reload
//! - The configuration composition root

pub mod fragments;
pub mod loader;
pub mod manager;

pub use fragments::{FragmentConfigStore, FragmentError, LoadReport, SkippedFragment};
pub use loader::{ConfigError, SettingsResolver};
pub use manager::ConfigManager;
