//! # Gatehouse Audit
//!
//! In-process audit trail for logins, authorization decisions and
//! permission changes.

mod audit_logger;

pub use audit_logger::{AuditEntry, AuditEventType, AuditLogger, AuditStats};
