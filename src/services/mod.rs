//! Service layer
//!
//! Behavior that sits above the infrastructure adapters and is consumed by
//! collaborators at the core boundary.

pub mod classifier;

pub use classifier::{classify, ORIGINAL_ERROR_KEY};
