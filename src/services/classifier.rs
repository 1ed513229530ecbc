//! Failure normalization
//!
//! [`classify`] turns any failure into an [`AlcisError`] so nothing outside
//! the taxonomy reaches a collaborator. It always logs exactly one entry at
//! error level on the given channel and never fails itself.

use serde_json::Value;
use std::io;
use std::sync::mpsc::RecvTimeoutError;

use crate::domain::errors::{AlcisError, AuthenticationKind, DatabaseKind, Details, ErrorKind};
use crate::infrastructure::logging::LogChannel;

/// Detail key holding the raw failure text.
pub const ORIGINAL_ERROR_KEY: &str = "original_error";

/// Platform failure categories with a fixed mapping into the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureCategory {
    PermissionDenied,
    TimedOut,
    Io,
    Unexpected,
}

impl FailureCategory {
    fn of(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                return match io_error.kind() {
                    io::ErrorKind::PermissionDenied => Self::PermissionDenied,
                    io::ErrorKind::TimedOut => Self::TimedOut,
                    _ => Self::Io,
                };
            }
            if matches!(
                cause.downcast_ref::<RecvTimeoutError>(),
                Some(RecvTimeoutError::Timeout)
            ) {
                return Self::TimedOut;
            }
        }
        Self::Unexpected
    }

    const fn kind(self) -> ErrorKind {
        match self {
            Self::PermissionDenied => {
                ErrorKind::Authentication(AuthenticationKind::UnauthorizedAccess)
            }
            Self::Io => ErrorKind::Database(DatabaseKind::Connection),
            Self::TimedOut | Self::Unexpected => ErrorKind::General,
        }
    }

    const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::TimedOut => "TIMEOUT",
            Self::Io => "CONNECTION_FAILED",
            Self::Unexpected => "UNEXPECTED_ERROR",
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Permission denied",
            Self::TimedOut => "Operation timed out",
            Self::Io => "Connection failed",
            Self::Unexpected => "Unexpected error",
        }
    }
}

/// Normalize `error` into the taxonomy and log it once on `channel`.
///
/// `context` is merged into the details last, so caller keys win over
/// keys set here, including `original_error`.
pub fn classify(error: anyhow::Error, channel: &LogChannel, context: Option<Details>) -> AlcisError {
    let context = context.unwrap_or_default();

    let (classified, summary) = match error.downcast::<AlcisError>() {
        Ok(existing) => {
            let merged = existing.with_details(context);
            let summary = format!("ALCIS error: {}", merged.message());
            (merged, summary)
        }
        Err(error) => {
            let category = FailureCategory::of(&error);
            let original = format!("{error:#}");
            let converted = AlcisError::new(
                category.kind(),
                format!("{}: {}", category.prefix(), error),
            )
            .with_code(category.code())
            .with_detail(ORIGINAL_ERROR_KEY, original)
            .with_details(context);
            let summary = format!("Error converted: {}", converted.message());
            (converted, summary)
        }
    };

    let details = Value::Object(classified.details().clone());
    channel.error(&format!(
        "{summary} [kind={} error_code={} details={details}]",
        classified.kind(),
        classified.effective_code()
    ));

    classified
}
