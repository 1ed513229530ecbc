//! Audit record model
//!
//! One record per audited operation, serialized as a single JSON object
//! whose `event` key names the operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Caller-supplied audit fields.
pub type AuditFields = Map<String, Value>;

/// Keys owned by the record envelope; callers cannot set them.
pub const RESERVED_FIELDS: [&str; 4] = ["event", "event_id", "timestamp", "level"];

/// Discriminator for audit records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// `authentication_attempt`
    AuthenticationAttempt,
    /// `policy_decision`
    PolicyDecision,
    /// `security_event`
    SecurityEvent,
    /// `data_access`
    DataAccess,
}

impl AuditEventKind {
    /// Value written under the `event` key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationAttempt => "authentication_attempt",
            Self::PolicyDecision => "policy_decision",
            Self::SecurityEvent => "security_event",
            Self::DataAccess => "data_access",
        }
    }
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of severity names accepted by security events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Written at DEBUG.
    Debug,
    /// Written at INFO; also the fallback for unknown names.
    Info,
    /// Written at WARN.
    Warning,
    /// Written at ERROR.
    Error,
    /// Written at ERROR.
    Critical,
}

impl Severity {
    /// Map a severity name, falling back to `Info` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            "critical" | "fatal" => Self::Critical,
            _ => Self::Info,
        }
    }
}

/// One audit record, serialized as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Operation that produced the record.
    pub event: AuditEventKind,
    /// Random v4 id, unique per record.
    pub event_id: Uuid,
    /// UTC time the record was built.
    pub timestamp: DateTime<Utc>,
    /// Level the record is written at.
    pub level: Severity,
    /// Operation fields merged with caller extras.
    #[serde(flatten)]
    pub fields: AuditFields,
}

impl AuditRecord {
    /// Build a record stamped now.
    ///
    /// `required` fields win over same-named `extra` fields; reserved
    /// envelope keys in `extra` are dropped.
    pub fn new(
        event: AuditEventKind,
        level: Severity,
        required: AuditFields,
        extra: AuditFields,
    ) -> Self {
        let mut fields: AuditFields = extra
            .into_iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .collect();
        fields.extend(required);

        Self {
            event,
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            fields,
        }
    }
}
