//! # Gatehouse Capability
//!
//! Client-side mirror of the authorization gate. A [`Session`] is built
//! once from the login response and answers `can(module, action)` without
//! a round trip. The snapshot stays as it was at login until the next
//! `login` or `logout`.

pub mod session;
pub mod snapshot;

pub use session::Session;
pub use snapshot::{normalize_entries, SnapshotEntry, SnapshotError};
