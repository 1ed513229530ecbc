//! Audit trail for security-relevant events
//!
//! Every record is written twice: as a JSON line into
//! `security_audit.jsonl` (all levels) and as a line on the `security`
//! channel at the record's level. Emission never fails from the caller's
//! point of view; sink errors are mirrored to the `error` channel.

use serde_json::{json, Value};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{warn, Level};

use super::channels::{ChannelLogRouter, LogChannel};
use super::config::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES};
use super::rotation::RotatingFileWriter;
use crate::domain::models::audit::{AuditEventKind, AuditFields, AuditRecord, Severity};

/// Log level a severity is written at.
pub const fn severity_level(severity: Severity) -> Level {
    match severity {
        Severity::Debug => Level::DEBUG,
        Severity::Info => Level::INFO,
        Severity::Warning => Level::WARN,
        Severity::Error | Severity::Critical => Level::ERROR,
    }
}

/// Emitter for structured audit records
#[derive(Debug)]
pub struct AuditEmitter {
    channel: Arc<LogChannel>,
    error_channel: Arc<LogChannel>,
    sink: Mutex<RotatingFileWriter>,
}

impl AuditEmitter {
    /// Bind to the router's `security` and `error` channels.
    pub fn new(router: &ChannelLogRouter) -> Self {
        let sink = RotatingFileWriter::new(
            router.config().audit_json_path(),
            DEFAULT_MAX_BYTES,
            DEFAULT_BACKUP_COUNT,
        );
        Self {
            channel: router.resolve("security"),
            error_channel: router.resolve("error"),
            sink: Mutex::new(sink),
        }
    }

    /// Record a login attempt against `platform`.
    pub fn record_auth_attempt(
        &self,
        platform: &str,
        username: &str,
        success: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        extra: AuditFields,
    ) {
        let mut fields = AuditFields::new();
        fields.insert("platform".into(), json!(platform));
        fields.insert("username".into(), json!(username));
        fields.insert("success".into(), json!(success));
        fields.insert("ip_address".into(), json!(ip_address));
        fields.insert("user_agent".into(), json!(user_agent));

        self.emit(AuditRecord::new(
            AuditEventKind::AuthenticationAttempt,
            Severity::Info,
            fields,
            extra,
        ));
    }

    /// Confidence is clamped to [0, 1]; an out-of-range input is kept as `raw_confidence`.
    pub fn record_policy_decision(
        &self,
        action: &str,
        decision: &str,
        confidence: f64,
        reasoning: AuditFields,
        extra: AuditFields,
    ) {
        let clamped = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut fields = AuditFields::new();
        fields.insert("action".into(), json!(action));
        fields.insert("decision".into(), json!(decision));
        fields.insert("confidence".into(), json!(clamped));
        fields.insert("reasoning".into(), Value::Object(reasoning));
        if !confidence.is_finite() || (clamped - confidence).abs() > f64::EPSILON {
            fields.insert("raw_confidence".into(), json!(confidence));
        }

        self.emit(AuditRecord::new(
            AuditEventKind::PolicyDecision,
            Severity::Info,
            fields,
            extra,
        ));
    }

    /// `severity` picks the level; unknown names are written at info.
    pub fn record_security_event(
        &self,
        event_type: &str,
        severity: &str,
        description: &str,
        extra: AuditFields,
    ) {
        let mut fields = AuditFields::new();
        fields.insert("event_type".into(), json!(event_type));
        fields.insert("severity".into(), json!(severity));
        fields.insert("description".into(), json!(description));

        self.emit(AuditRecord::new(
            AuditEventKind::SecurityEvent,
            Severity::from_name(severity),
            fields,
            extra,
        ));
    }

    /// Record a read or write of `resource` by `user`.
    pub fn record_data_access(
        &self,
        resource: &str,
        action: &str,
        user: &str,
        success: bool,
        extra: AuditFields,
    ) {
        let mut fields = AuditFields::new();
        fields.insert("resource".into(), json!(resource));
        fields.insert("action".into(), json!(action));
        fields.insert("user".into(), json!(user));
        fields.insert("success".into(), json!(success));

        self.emit(AuditRecord::new(
            AuditEventKind::DataAccess,
            Severity::Info,
            fields,
            extra,
        ));
    }

    fn emit(&self, record: AuditRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                self.report_failure(record.event, &e.to_string());
                return;
            }
        };

        self.channel.log(severity_level(record.level), &line);

        if let Err(e) = self.append(&line) {
            self.report_failure(record.event, &e.to_string());
        }
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(buf.as_bytes())?;
        sink.flush()
    }

    fn report_failure(&self, event: AuditEventKind, reason: &str) {
        warn!(event = %event, error = %reason, "failed to write audit record");
        self.error_channel
            .error(&format!("failed to write audit record {event}: {reason}"));
    }
}
