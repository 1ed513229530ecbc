//! Logging infrastructure
//!
//! Channel logging built on tracing and tracing-subscriber:
//! - Named channels, each with its own size-rotated file
//! - Console mirroring in debug mode
//! - Structured audit trail as JSON lines
//! - Process-wide diagnostics on stderr

pub mod audit;
pub mod channels;
pub mod config;
pub mod logger;
pub mod rotation;

pub use audit::AuditEmitter;
pub use channels::{ChannelLogRouter, LogChannel, LoggingError};
pub use config::{ChannelConfig, RouterConfig};
pub use logger::init_diagnostics;
pub use rotation::RotatingFileWriter;
