//! ALCIS - operational core
//!
//! Layered settings resolution, directory-scoped platform and policy
//! configuration, channel-routed rotating logs with a structured audit trail,
//! and a closed error taxonomy with a single normalization entry point.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): settings tree, fragment and audit models, error taxonomy
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, composition
//! - **Service Layer** (`services`): failure classification
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use alcis::CoreServices;
//!
//! fn main() -> anyhow::Result<()> {
//!     let core = CoreServices::initialize(std::env::current_dir()?)?;
//!     core.audit.record_data_access("reports/q3", "read", "alice", true, Default::default());
//!     if !core.config.validate() {
//!         core.channel("main").warn("configuration incomplete");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{AlcisError, AlcisResult, Details, ErrorBranch, ErrorKind};
pub use domain::models::{FragmentDocument, FragmentNamespace, Settings};
pub use infrastructure::config::{
    ConfigError, ConfigManager, FragmentConfigStore, LoadReport, SettingsResolver,
};
pub use infrastructure::logging::{AuditEmitter, ChannelLogRouter, LogChannel};
pub use infrastructure::CoreServices;
pub use services::classify;
