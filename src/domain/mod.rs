//! Domain layer for the ALCIS operational core
//!
//! Pure types: the settings tree, fragment and audit models, and the error
//! taxonomy. Nothing here performs I/O.

pub mod errors;
pub mod models;

// Re-export error types for convenient access
pub use errors::{AlcisError, AlcisResult, Details, ErrorBranch, ErrorKind};
