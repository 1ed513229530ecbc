//! Error taxonomy for the ALCIS platform.
//!
//! Every failure that crosses the core boundary is an [`AlcisError`]: one
//! payload shape (message, optional code, details) plus a closed, nested
//! [`ErrorKind`]. Branch membership is answered by `match`, never by comparing
//! names at runtime.

use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Free-form diagnostic context attached to an error.
pub type Details = Map<String, Value>;

/// Multi-factor authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MfaKind {
    /// No SMS code arrived in time.
    SmsTimeout,
    /// No email code arrived in time.
    EmailTimeout,
    /// No TOTP seed is stored for the account.
    TotpSecretNotFound,
    /// The submitted one-time code was rejected.
    InvalidCode,
}

/// Authentication failures, including the MFA sub-branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationKind {
    /// No stored credential for the platform.
    CredentialNotFound,
    /// The stored credential is no longer accepted.
    CredentialExpired,
    /// Access was refused, including OS permission errors.
    UnauthorizedAccess,
    /// An access token is past its lifetime.
    TokenExpired,
    /// The user declined an authorization request.
    ConsentDenied,
    /// Second-factor failure.
    Mfa(MfaKind),
}

/// Browser automation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlerKind {
    /// The browser could not be started.
    BrowserLaunch,
    /// A page did not finish loading.
    PageLoad,
    /// An expected page element is missing.
    ElementNotFound,
    /// The site rejected the login.
    LoginFailed,
    /// Automation was detected and blocked by the site.
    Detection,
}

/// Policy evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// An action breaks an active policy.
    Violation,
    /// No policy with the requested name.
    NotFound,
    /// The action is forbidden for this account.
    ActionNotAllowed,
}

/// Model and reasoning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiKind {
    /// The model could not be loaded.
    ModelLoad,
    /// Running the model failed.
    Inference,
    /// Output confidence fell below the configured threshold.
    ConfidenceThreshold,
    /// The reasoning chain did not converge.
    Reasoning,
}

/// Integrity and threat failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityKind {
    /// Encrypting or decrypting failed.
    Encryption,
    /// A checksum or signature did not match.
    Integrity,
    /// A hostile pattern was detected.
    ThreatDetected,
}

/// Settings failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationKind {
    /// A value is present but unusable.
    Invalid,
    /// A required value is absent.
    Missing,
}

/// Persistence failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    /// The database could not be reached.
    Connection,
    /// A statement failed.
    Query,
}

/// Top-level branch of the taxonomy an [`ErrorKind`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorBranch {
    /// `General` belongs to no sub-branch.
    Root,
    /// Authentication failures, MFA included.
    Authentication,
    /// Browser automation failures.
    Crawler,
    /// Policy evaluation failures.
    Policy,
    /// Model and reasoning failures.
    Ai,
    /// Integrity and threat failures.
    Security,
    /// Settings failures.
    Configuration,
    /// Persistence failures.
    Database,
}

/// Classification of an [`AlcisError`].
///
/// `General` is the root itself: timeouts and unexpected failures land here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timeouts and unexpected failures.
    General,
    /// See [`AuthenticationKind`].
    Authentication(AuthenticationKind),
    /// See [`CrawlerKind`].
    Crawler(CrawlerKind),
    /// See [`PolicyKind`].
    Policy(PolicyKind),
    /// See [`AiKind`].
    Ai(AiKind),
    /// See [`SecurityKind`].
    Security(SecurityKind),
    /// See [`ConfigurationKind`].
    Configuration(ConfigurationKind),
    /// See [`DatabaseKind`].
    Database(DatabaseKind),
}

impl ErrorKind {
    /// Top-level branch this kind belongs to.
    pub const fn branch(self) -> ErrorBranch {
        match self {
            Self::General => ErrorBranch::Root,
            Self::Authentication(_) => ErrorBranch::Authentication,
            Self::Crawler(_) => ErrorBranch::Crawler,
            Self::Policy(_) => ErrorBranch::Policy,
            Self::Ai(_) => ErrorBranch::Ai,
            Self::Security(_) => ErrorBranch::Security,
            Self::Configuration(_) => ErrorBranch::Configuration,
            Self::Database(_) => ErrorBranch::Database,
        }
    }

    /// Whether this kind is in the authentication branch, MFA included.
    pub const fn is_authentication(self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Also true for the MFA sub-branch only.
    pub const fn is_mfa(self) -> bool {
        matches!(self, Self::Authentication(AuthenticationKind::Mfa(_)))
    }

    /// Whether this kind is in the crawler branch.
    pub const fn is_crawler(self) -> bool {
        matches!(self, Self::Crawler(_))
    }

    /// Whether this kind is in the policy branch.
    pub const fn is_policy(self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Whether this kind is in the AI branch.
    pub const fn is_ai(self) -> bool {
        matches!(self, Self::Ai(_))
    }

    /// Whether this kind is in the security branch.
    pub const fn is_security(self) -> bool {
        matches!(self, Self::Security(_))
    }

    /// Whether this kind is in the configuration branch.
    pub const fn is_configuration(self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this kind is in the database branch.
    pub const fn is_database(self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Stable leaf name, e.g. `UnauthorizedAccess` or `SmsTimeout`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Authentication(auth) => match auth {
                AuthenticationKind::CredentialNotFound => "CredentialNotFound",
                AuthenticationKind::CredentialExpired => "CredentialExpired",
                AuthenticationKind::UnauthorizedAccess => "UnauthorizedAccess",
                AuthenticationKind::TokenExpired => "TokenExpired",
                AuthenticationKind::ConsentDenied => "ConsentDenied",
                AuthenticationKind::Mfa(MfaKind::SmsTimeout) => "SmsTimeout",
                AuthenticationKind::Mfa(MfaKind::EmailTimeout) => "EmailTimeout",
                AuthenticationKind::Mfa(MfaKind::TotpSecretNotFound) => "TotpSecretNotFound",
                AuthenticationKind::Mfa(MfaKind::InvalidCode) => "InvalidMfaCode",
            },
            Self::Crawler(crawler) => match crawler {
                CrawlerKind::BrowserLaunch => "BrowserLaunch",
                CrawlerKind::PageLoad => "PageLoad",
                CrawlerKind::ElementNotFound => "ElementNotFound",
                CrawlerKind::LoginFailed => "LoginFailed",
                CrawlerKind::Detection => "Detection",
            },
            Self::Policy(policy) => match policy {
                PolicyKind::Violation => "PolicyViolation",
                PolicyKind::NotFound => "PolicyNotFound",
                PolicyKind::ActionNotAllowed => "ActionNotAllowed",
            },
            Self::Ai(ai) => match ai {
                AiKind::ModelLoad => "ModelLoad",
                AiKind::Inference => "Inference",
                AiKind::ConfidenceThreshold => "ConfidenceThreshold",
                AiKind::Reasoning => "Reasoning",
            },
            Self::Security(security) => match security {
                SecurityKind::Encryption => "Encryption",
                SecurityKind::Integrity => "Integrity",
                SecurityKind::ThreatDetected => "ThreatDetected",
            },
            Self::Configuration(config) => match config {
                ConfigurationKind::Invalid => "InvalidConfiguration",
                ConfigurationKind::Missing => "MissingConfiguration",
            },
            Self::Database(db) => match db {
                DatabaseKind::Connection => "DatabaseConnection",
                DatabaseKind::Query => "DatabaseQuery",
            },
        }
    }

    /// Code reported when an error was built without an explicit one.
    pub const fn default_code(self) -> &'static str {
        match self {
            Self::General => "ALCIS_ERROR",
            Self::Authentication(auth) => match auth {
                AuthenticationKind::CredentialNotFound => "CREDENTIAL_NOT_FOUND",
                AuthenticationKind::CredentialExpired => "CREDENTIAL_EXPIRED",
                AuthenticationKind::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
                AuthenticationKind::TokenExpired => "TOKEN_EXPIRED",
                AuthenticationKind::ConsentDenied => "CONSENT_DENIED",
                AuthenticationKind::Mfa(MfaKind::SmsTimeout) => "MFA_SMS_TIMEOUT",
                AuthenticationKind::Mfa(MfaKind::EmailTimeout) => "MFA_EMAIL_TIMEOUT",
                AuthenticationKind::Mfa(MfaKind::TotpSecretNotFound) => "MFA_TOTP_SECRET_NOT_FOUND",
                AuthenticationKind::Mfa(MfaKind::InvalidCode) => "MFA_INVALID_CODE",
            },
            Self::Crawler(crawler) => match crawler {
                CrawlerKind::BrowserLaunch => "BROWSER_LAUNCH_FAILED",
                CrawlerKind::PageLoad => "PAGE_LOAD_FAILED",
                CrawlerKind::ElementNotFound => "ELEMENT_NOT_FOUND",
                CrawlerKind::LoginFailed => "LOGIN_FAILED",
                CrawlerKind::Detection => "BOT_DETECTED",
            },
            Self::Policy(policy) => match policy {
                PolicyKind::Violation => "POLICY_VIOLATION",
                PolicyKind::NotFound => "POLICY_NOT_FOUND",
                PolicyKind::ActionNotAllowed => "ACTION_NOT_ALLOWED",
            },
            Self::Ai(ai) => match ai {
                AiKind::ModelLoad => "MODEL_LOAD_FAILED",
                AiKind::Inference => "INFERENCE_FAILED",
                AiKind::ConfidenceThreshold => "CONFIDENCE_BELOW_THRESHOLD",
                AiKind::Reasoning => "REASONING_FAILED",
            },
            Self::Security(security) => match security {
                SecurityKind::Encryption => "ENCRYPTION_FAILED",
                SecurityKind::Integrity => "INTEGRITY_CHECK_FAILED",
                SecurityKind::ThreatDetected => "THREAT_DETECTED",
            },
            Self::Configuration(config) => match config {
                ConfigurationKind::Invalid => "INVALID_CONFIGURATION",
                ConfigurationKind::Missing => "MISSING_CONFIGURATION",
            },
            Self::Database(db) => match db {
                DatabaseKind::Connection => "CONNECTION_FAILED",
                DatabaseKind::Query => "QUERY_FAILED",
            },
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AuthenticationKind> for ErrorKind {
    fn from(kind: AuthenticationKind) -> Self {
        Self::Authentication(kind)
    }
}

impl From<MfaKind> for ErrorKind {
    fn from(kind: MfaKind) -> Self {
        Self::Authentication(AuthenticationKind::Mfa(kind))
    }
}

impl From<CrawlerKind> for ErrorKind {
    fn from(kind: CrawlerKind) -> Self {
        Self::Crawler(kind)
    }
}

impl From<PolicyKind> for ErrorKind {
    fn from(kind: PolicyKind) -> Self {
        Self::Policy(kind)
    }
}

impl From<AiKind> for ErrorKind {
    fn from(kind: AiKind) -> Self {
        Self::Ai(kind)
    }
}

impl From<SecurityKind> for ErrorKind {
    fn from(kind: SecurityKind) -> Self {
        Self::Security(kind)
    }
}

impl From<ConfigurationKind> for ErrorKind {
    fn from(kind: ConfigurationKind) -> Self {
        Self::Configuration(kind)
    }
}

impl From<DatabaseKind> for ErrorKind {
    fn from(kind: DatabaseKind) -> Self {
        Self::Database(kind)
    }
}

/// A classified platform error.
///
/// Built once and then only read; the `with_*` builders consume `self`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AlcisError {
    message: String,
    kind: ErrorKind,
    error_code: Option<String>,
    details: Details,
}

impl AlcisError {
    /// Error of `kind` with no explicit code and empty details.
    pub fn new(kind: impl Into<ErrorKind>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            error_code: None,
            details: Details::new(),
        }
    }

    /// Root-level error with no branch.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::General, message)
    }

    /// Set the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Add one detail entry, replacing any existing value for `key`.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Merge `details` in; incoming keys replace existing ones.
    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details.extend(details);
        self
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Taxonomy leaf.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Code given by the caller, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// The explicit code, or the kind's default when none was given.
    pub fn effective_code(&self) -> &str {
        self.error_code
            .as_deref()
            .unwrap_or_else(|| self.kind.default_code())
    }

    /// Diagnostic context.
    pub const fn details(&self) -> &Details {
        &self.details
    }

    /// HTTP status used when this error reaches a request handler.
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// JSON body for HTTP error responses: `{error, error_code, details}`.
    pub fn to_response_body(&self) -> Value {
        json!({
            "error": self.message,
            "error_code": self.effective_code(),
            "details": self.details,
        })
    }
}

/// Body for failures that were never classified (HTTP 500).
pub fn internal_error_body() -> Value {
    json!({
        "error": "Internal server error",
        "message": "An unexpected error occurred",
    })
}

/// Result alias for operations failing with [`AlcisError`].
pub type AlcisResult<T> = Result<T, AlcisError>;
