//! Infrastructure layer module
//!
//! Adapters that touch the filesystem and the process environment:
//! - Settings resolution and fragment configuration
//! - Channel logging and the audit trail
//! - Explicit composition of the core services

pub mod config;
pub mod logging;
pub mod setup;

pub use setup::CoreServices;
