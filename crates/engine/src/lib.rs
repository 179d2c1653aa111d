//! # Gatehouse Engine
//!
//! Integration layer: wires the store, the RBAC managers and the audit
//! trail into one [`AccessControl`] value, and implements login and
//! catalog seeding on top of them.

mod access_control;
pub mod seed;

pub use access_control::{AccessControl, EngineError};
pub use seed::{CatalogSeed, SeedReport};

// Re-export dependencies
pub use audit::{AuditEntry, AuditEventType, AuditStats};
pub use rbac::{MemoryStore, RequestContext, RequiredPermission};
