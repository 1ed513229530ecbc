//! Domain models.

pub mod audit;
pub mod fragment;
pub mod settings;

pub use audit::{AuditEventKind, AuditFields, AuditRecord, Severity};
pub use fragment::{FragmentDocument, FragmentNamespace};
pub use settings::{
    AiSettings, CacheSettings, CrawlSettings, DatabaseSettings, LoggingSettings,
    SecuritySettings, Settings,
};
