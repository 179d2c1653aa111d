//! Access Store - the persistence port of the RBAC engine
//!
//! The managers in this crate define WHAT they need from storage; adapters
//! decide HOW. The store enforces the same constraints a relational schema
//! would: unique codes/keys/names, foreign keys on insert, and RESTRICT on
//! delete. Managers translate violations into the error taxonomy.
//!
//! ```text
//! Manager layer              │  Adapter layer
//! ───────────────────────────┼────────────────────────
//! CatalogManager             │  MemoryStore
//! AssignmentSynchronizer ──► │    (RwLock + copy-on-write transactions)
//! AuthorizationGate          │
//! ```

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::StoreSnapshot;

use shared::{
    AccessError, Action, ActionId, AssignmentId, CatalogEntryUpdate, Module, ModuleId, NewAction,
    NewModule, NewPermission, NewPrincipal, NewRole, Permission, PermissionId, Principal,
    PrincipalId, PrincipalUpdate, Role, RoleId, RoleUpdate,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index already holds this value
    #[error("Unique constraint '{constraint}' violated by '{value}'")]
    UniqueViolation {
        constraint: &'static str,
        value: String,
    },

    /// An inserted row references a row that does not exist
    #[error("Foreign key '{constraint}' violated: no row with id {id}")]
    ForeignKeyViolation { constraint: &'static str, id: u64 },

    /// A delete was blocked by dependent rows
    #[error("{entity} '{id}' is still referenced by {count} {referenced_by}")]
    Restricted {
        entity: &'static str,
        id: u64,
        referenced_by: &'static str,
        count: usize,
    },

    /// The row addressed by an update or delete does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A table's id sequence has no id left to issue
    #[error("Id sequence for '{table}' is exhausted")]
    SequenceExhausted { table: &'static str },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Inconsistent snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } | StoreError::Restricted { .. } => {
                AccessError::Conflict(err.to_string())
            }
            StoreError::ForeignKeyViolation { .. } => AccessError::Validation(err.to_string()),
            StoreError::NotFound { entity, id } => AccessError::not_found(entity, id),
            StoreError::LockPoisoned
            | StoreError::SequenceExhausted { .. }
            | StoreError::InvalidSnapshot(_)
            | StoreError::Io(_)
            | StoreError::Json(_) => AccessError::Internal(err.to_string()),
        }
    }
}

/// A permission granted to a role, joined with its module and action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRow {
    pub permission: Permission,
    pub module: Module,
    pub action: Action,
}

/// Writes available inside a store transaction.
///
/// Everything done through a transaction becomes visible at once when the
/// closure returns `Ok`, or not at all.
pub trait AssignmentTransaction {
    /// Permission ids currently granted to a role, ascending
    fn assigned_permission_ids(&self, role_id: RoleId) -> Vec<PermissionId>;

    /// Delete every assignment row of a role, returning how many were removed
    fn delete_assignments_for_role(&mut self, role_id: RoleId) -> StoreResult<usize>;

    /// Insert one assignment row
    fn insert_assignment(
        &mut self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> StoreResult<AssignmentId>;
}

/// Access Store trait
///
/// Implementations must be safe to share between threads: the gate reads
/// concurrently with catalog and assignment writes.
pub trait AccessStore: Send + Sync {
    // ---- modules ----

    fn insert_module(&self, module: NewModule) -> StoreResult<Module>;

    /// Update a module. A code change recomputes every dependent
    /// permission key in the same write.
    fn update_module(&self, id: ModuleId, update: CatalogEntryUpdate) -> StoreResult<Module>;

    fn delete_module(&self, id: ModuleId) -> StoreResult<()>;

    fn find_module(&self, id: ModuleId) -> StoreResult<Option<Module>>;

    fn find_module_by_code(&self, code: &str) -> StoreResult<Option<Module>>;

    /// All modules, ascending by id
    fn list_modules(&self) -> StoreResult<Vec<Module>>;

    // ---- actions ----

    fn insert_action(&self, action: NewAction) -> StoreResult<Action>;

    /// Update an action. A code change recomputes every dependent
    /// permission key in the same write.
    fn update_action(&self, id: ActionId, update: CatalogEntryUpdate) -> StoreResult<Action>;

    fn delete_action(&self, id: ActionId) -> StoreResult<()>;

    fn find_action(&self, id: ActionId) -> StoreResult<Option<Action>>;

    fn find_action_by_code(&self, code: &str) -> StoreResult<Option<Action>>;

    /// All actions, ascending by id
    fn list_actions(&self) -> StoreResult<Vec<Action>>;

    // ---- permissions ----

    /// Insert a permission, deriving its key from the current codes
    fn insert_permission(&self, permission: NewPermission) -> StoreResult<Permission>;

    fn update_permission_label(&self, id: PermissionId, label: String)
        -> StoreResult<Permission>;

    fn delete_permission(&self, id: PermissionId) -> StoreResult<()>;

    fn find_permission(&self, id: PermissionId) -> StoreResult<Option<Permission>>;

    fn find_permission_by_key(&self, key: &str) -> StoreResult<Option<Permission>>;

    /// All permissions, ascending by id
    fn list_permissions(&self) -> StoreResult<Vec<Permission>>;

    /// The subset of `ids` with no permission row, ascending and deduplicated
    fn missing_permissions(&self, ids: &[PermissionId]) -> StoreResult<Vec<PermissionId>>;

    // ---- roles ----

    fn insert_role(&self, role: NewRole) -> StoreResult<Role>;

    fn update_role(&self, id: RoleId, update: RoleUpdate) -> StoreResult<Role>;

    /// Delete a role and its assignment rows. Restricted by principals.
    fn delete_role(&self, id: RoleId) -> StoreResult<()>;

    fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>>;

    fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    /// All roles, ascending by id
    fn list_roles(&self) -> StoreResult<Vec<Role>>;

    // ---- principals ----

    fn insert_principal(&self, principal: NewPrincipal) -> StoreResult<Principal>;

    fn update_principal(&self, id: PrincipalId, update: PrincipalUpdate)
        -> StoreResult<Principal>;

    fn find_principal(&self, id: PrincipalId) -> StoreResult<Option<Principal>>;

    /// All principals, ascending by id
    fn list_principals(&self) -> StoreResult<Vec<Principal>>;

    // ---- assignments ----

    /// Permission ids granted to a role, ascending
    fn assigned_permission_ids(&self, role_id: RoleId) -> StoreResult<Vec<PermissionId>>;

    /// Grants of a role joined with module and action, in permission id order
    fn grant_rows(&self, role_id: RoleId) -> StoreResult<Vec<GrantRow>>;

    /// Indexed existence check on `(role, module code, action code)`.
    ///
    /// True only when the role exists, is active, and holds the permission.
    /// Unknown codes are simply absent and yield `false`.
    fn role_has_permission(
        &self,
        role_id: RoleId,
        module_code: &str,
        action_code: &str,
    ) -> StoreResult<bool>;

    /// Run `f` inside one atomic transaction.
    ///
    /// Readers observe the state before or after the transaction, never a
    /// partial one. An `Err` from `f` discards every write made through it.
    fn transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut dyn AssignmentTransaction) -> StoreResult<T>;
}
