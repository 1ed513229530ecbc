//! Fragment namespaces and documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One platform or policy configuration document.
pub type FragmentDocument = Map<String, Value>;

/// The two disjoint fragment namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentNamespace {
    /// `config/platforms/`
    Platform,
    /// `config/policies/`
    Policy,
}

impl FragmentNamespace {
    /// Both namespaces, in load order.
    pub const ALL: [Self; 2] = [Self::Platform, Self::Policy];

    /// Directory under `config/` holding this namespace's files.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Platform => "platforms",
            Self::Policy => "policies",
        }
    }

    /// Singular name used in messages and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Policy => "policy",
        }
    }
}

impl fmt::Display for FragmentNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
