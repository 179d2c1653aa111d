//! # Gatehouse Shared
//!
//! Types used across every Gatehouse crate: identifiers, catalog and role
//! records, the access tree embedded in login responses, the error
//! taxonomy, and engine configuration.

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod id;
pub mod role;

// Re-exports
pub use access::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use id::*;
pub use role::*;
