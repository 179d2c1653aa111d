//! # Gatehouse RBAC
//!
//! Role-Based Access Control for the back office.
//!
//! ## Components
//!
//! - `CatalogManager` - Modules, actions and permissions
//! - `RoleStore` - Role definitions
//! - `PrincipalDirectory` - Principal role and status
//! - `AssignmentSynchronizer` - Transactional replace of a role's permissions
//! - `AccessResolver` - Permission tree of a role
//! - `AuthorizationGate` - Per-request permission check
//! - `store` - Persistence port and the in-memory adapter

pub mod access_resolver;
pub mod assignment;
pub mod catalog;
pub mod gate;
pub mod principals;
pub mod role_store;
pub mod store;

pub use access_resolver::AccessResolver;
pub use assignment::AssignmentSynchronizer;
pub use catalog::CatalogManager;
pub use gate::{AuthorizationGate, RequestContext, RequiredPermission};
pub use principals::PrincipalDirectory;
pub use role_store::RoleStore;
pub use store::{AccessStore, MemoryStore, StoreError, StoreSnapshot};
