//! In-memory Access Store
//!
//! Thread-safe implementation using `RwLock`. Every write is copy-on-write:
//! the state is cloned, the change applied to the draft, and the draft
//! swapped in only if the whole change succeeded. Readers hold the read
//! lock, so they see the state before or after a write and never a partial
//! one. Catalog data is small and low-churn, which keeps the clone cheap.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use shared::{
    Action, ActionId, AssignmentId, CatalogEntryUpdate, Module, ModuleId, NewAction, NewModule,
    NewPermission, NewPrincipal, NewRole, Permission, PermissionId, Principal, PrincipalId,
    PrincipalUpdate, Role, RoleAssignment, RoleId, RoleUpdate,
};

use super::snapshot::{Sequences, StoreSnapshot};
use super::{AccessStore, AssignmentTransaction, GrantRow, StoreError, StoreResult};

/// Tables plus the unique indexes a relational schema would declare
#[derive(Debug, Clone, Default)]
struct StoreState {
    modules: BTreeMap<ModuleId, Module>,
    actions: BTreeMap<ActionId, Action>,
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    principals: BTreeMap<PrincipalId, Principal>,
    assignments: BTreeMap<AssignmentId, RoleAssignment>,

    module_codes: HashMap<String, ModuleId>,
    action_codes: HashMap<String, ActionId>,
    permission_keys: HashMap<String, PermissionId>,
    permission_pairs: HashMap<(ModuleId, ActionId), PermissionId>,
    role_names: HashMap<String, RoleId>,
    usernames: HashMap<String, PrincipalId>,
    /// Unique index on (role_id, permission_id)
    grants: BTreeMap<(RoleId, PermissionId), AssignmentId>,

    sequences: Sequences,
}

fn role_grant_range(
    role_id: RoleId,
) -> std::ops::RangeInclusive<(RoleId, PermissionId)> {
    (role_id, PermissionId::new(0))..=(role_id, PermissionId::new(u64::MAX))
}

impl StoreState {
    // ---- modules ----

    fn put_module(&mut self, module: Module) -> StoreResult<()> {
        if self.modules.contains_key(&module.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "modules.id",
                value: module.id.to_string(),
            });
        }
        if self.module_codes.contains_key(&module.code) {
            return Err(StoreError::UniqueViolation {
                constraint: "modules.code",
                value: module.code,
            });
        }
        Sequences::observe(&mut self.sequences.module, module.id.get());
        self.module_codes.insert(module.code.clone(), module.id);
        self.modules.insert(module.id, module);
        Ok(())
    }

    fn insert_module(&mut self, new: NewModule) -> StoreResult<Module> {
        let id = ModuleId::new(Sequences::next(self.sequences.module, "module")?);
        let module = Module {
            id,
            code: new.code,
            title: new.title,
        };
        self.put_module(module.clone())?;
        Ok(module)
    }

    fn update_module(&mut self, id: ModuleId, update: CatalogEntryUpdate) -> StoreResult<Module> {
        let current = self.modules.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Module",
            id: id.get(),
        })?;

        let mut updated = current.clone();
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(code) = update.code {
            if code != current.code {
                if self.module_codes.contains_key(&code) {
                    return Err(StoreError::UniqueViolation {
                        constraint: "modules.code",
                        value: code,
                    });
                }
                self.module_codes.remove(&current.code);
                self.module_codes.insert(code.clone(), id);
                updated.code = code;
            }
        }

        self.modules.insert(id, updated.clone());
        if updated.code != current.code {
            self.rekey_permissions(|p| p.module_id == id)?;
        }
        Ok(updated)
    }

    fn delete_module(&mut self, id: ModuleId) -> StoreResult<()> {
        let module = self.modules.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Module",
            id: id.get(),
        })?;
        let count = self.permissions.values().filter(|p| p.module_id == id).count();
        if count > 0 {
            return Err(StoreError::Restricted {
                entity: "Module",
                id: id.get(),
                referenced_by: "permission(s)",
                count,
            });
        }
        self.module_codes.remove(&module.code);
        self.modules.remove(&id);
        Ok(())
    }

    // ---- actions ----

    fn put_action(&mut self, action: Action) -> StoreResult<()> {
        if self.actions.contains_key(&action.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "actions.id",
                value: action.id.to_string(),
            });
        }
        if self.action_codes.contains_key(&action.code) {
            return Err(StoreError::UniqueViolation {
                constraint: "actions.code",
                value: action.code,
            });
        }
        Sequences::observe(&mut self.sequences.action, action.id.get());
        self.action_codes.insert(action.code.clone(), action.id);
        self.actions.insert(action.id, action);
        Ok(())
    }

    fn insert_action(&mut self, new: NewAction) -> StoreResult<Action> {
        let id = ActionId::new(Sequences::next(self.sequences.action, "action")?);
        let action = Action {
            id,
            code: new.code,
            title: new.title,
        };
        self.put_action(action.clone())?;
        Ok(action)
    }

    fn update_action(&mut self, id: ActionId, update: CatalogEntryUpdate) -> StoreResult<Action> {
        let current = self.actions.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Action",
            id: id.get(),
        })?;

        let mut updated = current.clone();
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(code) = update.code {
            if code != current.code {
                if self.action_codes.contains_key(&code) {
                    return Err(StoreError::UniqueViolation {
                        constraint: "actions.code",
                        value: code,
                    });
                }
                self.action_codes.remove(&current.code);
                self.action_codes.insert(code.clone(), id);
                updated.code = code;
            }
        }

        self.actions.insert(id, updated.clone());
        if updated.code != current.code {
            self.rekey_permissions(|p| p.action_id == id)?;
        }
        Ok(updated)
    }

    fn delete_action(&mut self, id: ActionId) -> StoreResult<()> {
        let action = self.actions.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Action",
            id: id.get(),
        })?;
        let count = self.permissions.values().filter(|p| p.action_id == id).count();
        if count > 0 {
            return Err(StoreError::Restricted {
                entity: "Action",
                id: id.get(),
                referenced_by: "permission(s)",
                count,
            });
        }
        self.action_codes.remove(&action.code);
        self.actions.remove(&id);
        Ok(())
    }

    // ---- permissions ----

    fn derive_key(&self, module_id: ModuleId, action_id: ActionId) -> StoreResult<String> {
        let module = self
            .modules
            .get(&module_id)
            .ok_or(StoreError::ForeignKeyViolation {
                constraint: "permissions.module_id",
                id: module_id.get(),
            })?;
        let action = self
            .actions
            .get(&action_id)
            .ok_or(StoreError::ForeignKeyViolation {
                constraint: "permissions.action_id",
                id: action_id.get(),
            })?;
        Ok(Permission::key_for(&module.code, &action.code))
    }

    /// Recompute the key of every permission matching `affected`.
    ///
    /// Codes are unique, so recomputed keys cannot collide with each other
    /// or with untouched keys.
    fn rekey_permissions(&mut self, affected: impl Fn(&Permission) -> bool) -> StoreResult<()> {
        let ids: Vec<PermissionId> = self
            .permissions
            .values()
            .filter(|p| affected(p))
            .map(|p| p.id)
            .collect();

        for id in ids {
            let Some(permission) = self.permissions.get(&id).cloned() else {
                continue;
            };
            let key = self.derive_key(permission.module_id, permission.action_id)?;
            self.permission_keys.remove(&permission.permission_key);
            self.permission_keys.insert(key.clone(), id);
            if let Some(p) = self.permissions.get_mut(&id) {
                p.permission_key = key;
            }
        }
        Ok(())
    }

    fn put_permission(&mut self, permission: Permission) -> StoreResult<()> {
        if self.permissions.contains_key(&permission.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "permissions.id",
                value: permission.id.to_string(),
            });
        }
        let key = self.derive_key(permission.module_id, permission.action_id)?;
        if key != permission.permission_key {
            return Err(StoreError::InvalidSnapshot(format!(
                "permission {} has key '{}' but its codes derive '{}'",
                permission.id, permission.permission_key, key
            )));
        }
        if self.permission_keys.contains_key(&key)
            || self
                .permission_pairs
                .contains_key(&(permission.module_id, permission.action_id))
        {
            return Err(StoreError::UniqueViolation {
                constraint: "permissions.permission_key",
                value: key,
            });
        }
        Sequences::observe(&mut self.sequences.permission, permission.id.get());
        self.permission_keys.insert(key, permission.id);
        self.permission_pairs
            .insert((permission.module_id, permission.action_id), permission.id);
        self.permissions.insert(permission.id, permission);
        Ok(())
    }

    fn insert_permission(&mut self, new: NewPermission) -> StoreResult<Permission> {
        let permission = Permission {
            id: PermissionId::new(Sequences::next(self.sequences.permission, "permission")?),
            module_id: new.module_id,
            action_id: new.action_id,
            permission_key: self.derive_key(new.module_id, new.action_id)?,
            label: new.label,
        };
        self.put_permission(permission.clone())?;
        Ok(permission)
    }

    fn update_permission_label(&mut self, id: PermissionId, label: String) -> StoreResult<Permission> {
        let permission = self.permissions.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "Permission",
            id: id.get(),
        })?;
        permission.label = label;
        Ok(permission.clone())
    }

    fn delete_permission(&mut self, id: PermissionId) -> StoreResult<()> {
        let permission = self.permissions.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Permission",
            id: id.get(),
        })?;
        let count = self.grants.keys().filter(|(_, p)| *p == id).count();
        if count > 0 {
            return Err(StoreError::Restricted {
                entity: "Permission",
                id: id.get(),
                referenced_by: "role assignment(s)",
                count,
            });
        }
        self.permission_keys.remove(&permission.permission_key);
        self.permission_pairs
            .remove(&(permission.module_id, permission.action_id));
        self.permissions.remove(&id);
        Ok(())
    }

    // ---- roles ----

    fn put_role(&mut self, role: Role) -> StoreResult<()> {
        if self.roles.contains_key(&role.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "roles.id",
                value: role.id.to_string(),
            });
        }
        if self.role_names.contains_key(&role.name) {
            return Err(StoreError::UniqueViolation {
                constraint: "roles.name",
                value: role.name,
            });
        }
        Sequences::observe(&mut self.sequences.role, role.id.get());
        self.role_names.insert(role.name.clone(), role.id);
        self.roles.insert(role.id, role);
        Ok(())
    }

    fn insert_role(&mut self, new: NewRole) -> StoreResult<Role> {
        let role = Role {
            id: RoleId::new(Sequences::next(self.sequences.role, "role")?),
            name: new.name,
            description: new.description,
            status: new.status,
        };
        self.put_role(role.clone())?;
        Ok(role)
    }

    fn update_role(&mut self, id: RoleId, update: RoleUpdate) -> StoreResult<Role> {
        let current = self.roles.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Role",
            id: id.get(),
        })?;

        let mut updated = current.clone();
        if let Some(name) = update.name {
            if name != current.name {
                if self.role_names.contains_key(&name) {
                    return Err(StoreError::UniqueViolation {
                        constraint: "roles.name",
                        value: name,
                    });
                }
                self.role_names.remove(&current.name);
                self.role_names.insert(name.clone(), id);
                updated.name = name;
            }
        }
        if let Some(description) = update.description {
            updated.description = description;
        }
        if let Some(status) = update.status {
            updated.status = status;
        }

        self.roles.insert(id, updated.clone());
        Ok(updated)
    }

    fn delete_role(&mut self, id: RoleId) -> StoreResult<()> {
        let role = self.roles.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "Role",
            id: id.get(),
        })?;
        let count = self
            .principals
            .values()
            .filter(|p| p.role_id == Some(id))
            .count();
        if count > 0 {
            return Err(StoreError::Restricted {
                entity: "Role",
                id: id.get(),
                referenced_by: "principal(s)",
                count,
            });
        }
        self.delete_assignments_for_role(id)?;
        self.role_names.remove(&role.name);
        self.roles.remove(&id);
        Ok(())
    }

    // ---- principals ----

    fn check_role_reference(&self, role_id: Option<RoleId>) -> StoreResult<()> {
        match role_id {
            Some(role_id) if !self.roles.contains_key(&role_id) => {
                Err(StoreError::ForeignKeyViolation {
                    constraint: "principals.role_id",
                    id: role_id.get(),
                })
            }
            _ => Ok(()),
        }
    }

    fn put_principal(&mut self, principal: Principal) -> StoreResult<()> {
        if self.principals.contains_key(&principal.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "principals.id",
                value: principal.id.to_string(),
            });
        }
        if self.usernames.contains_key(&principal.username) {
            return Err(StoreError::UniqueViolation {
                constraint: "principals.username",
                value: principal.username,
            });
        }
        self.check_role_reference(principal.role_id)?;
        Sequences::observe(&mut self.sequences.principal, principal.id.get());
        self.usernames
            .insert(principal.username.clone(), principal.id);
        self.principals.insert(principal.id, principal);
        Ok(())
    }

    fn insert_principal(&mut self, new: NewPrincipal) -> StoreResult<Principal> {
        let principal = Principal {
            id: PrincipalId::new(Sequences::next(self.sequences.principal, "principal")?),
            username: new.username,
            role_id: new.role_id,
            status: new.status,
        };
        self.put_principal(principal.clone())?;
        Ok(principal)
    }

    fn update_principal(&mut self, id: PrincipalId, update: PrincipalUpdate) -> StoreResult<Principal> {
        if let Some(role_id) = update.role_id {
            self.check_role_reference(role_id)?;
        }
        let principal = self.principals.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "Principal",
            id: id.get(),
        })?;
        if let Some(role_id) = update.role_id {
            principal.role_id = role_id;
        }
        if let Some(status) = update.status {
            principal.status = status;
        }
        Ok(principal.clone())
    }

    // ---- assignments ----

    fn put_assignment(&mut self, assignment: RoleAssignment) -> StoreResult<()> {
        if self.assignments.contains_key(&assignment.id) {
            return Err(StoreError::UniqueViolation {
                constraint: "role_assignments.id",
                value: assignment.id.to_string(),
            });
        }
        if !self.roles.contains_key(&assignment.role_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "role_assignments.role_id",
                id: assignment.role_id.get(),
            });
        }
        if !self.permissions.contains_key(&assignment.permission_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "role_assignments.permission_id",
                id: assignment.permission_id.get(),
            });
        }
        let pair = (assignment.role_id, assignment.permission_id);
        if self.grants.contains_key(&pair) {
            return Err(StoreError::UniqueViolation {
                constraint: "role_assignments.role_permission",
                value: format!("{}/{}", pair.0, pair.1),
            });
        }
        Sequences::observe(&mut self.sequences.assignment, assignment.id.get());
        self.grants.insert(pair, assignment.id);
        self.assignments.insert(assignment.id, assignment);
        Ok(())
    }

    fn grant_rows(&self, role_id: RoleId) -> StoreResult<Vec<GrantRow>> {
        self.grants
            .range(role_grant_range(role_id))
            .map(|((_, permission_id), _)| {
                let permission = self.permissions.get(permission_id).ok_or(
                    StoreError::ForeignKeyViolation {
                        constraint: "role_assignments.permission_id",
                        id: permission_id.get(),
                    },
                )?;
                let module = self.modules.get(&permission.module_id).ok_or(
                    StoreError::ForeignKeyViolation {
                        constraint: "permissions.module_id",
                        id: permission.module_id.get(),
                    },
                )?;
                let action = self.actions.get(&permission.action_id).ok_or(
                    StoreError::ForeignKeyViolation {
                        constraint: "permissions.action_id",
                        id: permission.action_id.get(),
                    },
                )?;
                Ok(GrantRow {
                    permission: permission.clone(),
                    module: module.clone(),
                    action: action.clone(),
                })
            })
            .collect()
    }

    fn role_has_permission(&self, role_id: RoleId, module_code: &str, action_code: &str) -> bool {
        if !self.roles.get(&role_id).is_some_and(|r| r.is_active()) {
            return false;
        }
        let (Some(module_id), Some(action_id)) = (
            self.module_codes.get(module_code),
            self.action_codes.get(action_code),
        ) else {
            return false;
        };
        self.permission_pairs
            .get(&(*module_id, *action_id))
            .is_some_and(|permission_id| self.grants.contains_key(&(role_id, *permission_id)))
    }

    // ---- snapshots ----

    fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let mut state = StoreState {
            sequences: snapshot.sequences,
            ..Default::default()
        };
        for module in snapshot.modules {
            state.put_module(module)?;
        }
        for action in snapshot.actions {
            state.put_action(action)?;
        }
        for permission in snapshot.permissions {
            state.put_permission(permission)?;
        }
        for role in snapshot.roles {
            state.put_role(role)?;
        }
        for principal in snapshot.principals {
            state.put_principal(principal)?;
        }
        for assignment in snapshot.assignments {
            state.put_assignment(assignment)?;
        }
        Ok(state)
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            modules: self.modules.values().cloned().collect(),
            actions: self.actions.values().cloned().collect(),
            permissions: self.permissions.values().cloned().collect(),
            roles: self.roles.values().cloned().collect(),
            principals: self.principals.values().cloned().collect(),
            assignments: self.assignments.values().cloned().collect(),
            sequences: self.sequences.clone(),
        }
    }
}

impl AssignmentTransaction for StoreState {
    fn assigned_permission_ids(&self, role_id: RoleId) -> Vec<PermissionId> {
        self.grants
            .range(role_grant_range(role_id))
            .map(|((_, permission_id), _)| *permission_id)
            .collect()
    }

    fn delete_assignments_for_role(&mut self, role_id: RoleId) -> StoreResult<usize> {
        let rows: Vec<((RoleId, PermissionId), AssignmentId)> = self
            .grants
            .range(role_grant_range(role_id))
            .map(|(pair, id)| (*pair, *id))
            .collect();

        for (pair, id) in &rows {
            self.grants.remove(pair);
            self.assignments.remove(id);
        }
        Ok(rows.len())
    }

    fn insert_assignment(
        &mut self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> StoreResult<AssignmentId> {
        let id = AssignmentId::new(Sequences::next(self.sequences.assignment, "assignment")?);
        self.put_assignment(RoleAssignment {
            id,
            role_id,
            permission_id,
        })?;
        Ok(id)
    }
}

/// In-memory Access Store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, enforcing every constraint
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        Ok(Self {
            state: Arc::new(RwLock::new(StoreState::from_snapshot(snapshot)?)),
        })
    }

    /// Capture every table
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        Ok(self.read()?.to_snapshot())
    }

    /// Load a store from a JSON snapshot file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        Self::from_snapshot(snapshot)
    }

    /// Write the store to a JSON snapshot file
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.snapshot()?)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    /// Apply `f` to a draft of the state and publish it only on success
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

impl AccessStore for MemoryStore {
    fn insert_module(&self, module: NewModule) -> StoreResult<Module> {
        self.mutate(|s| s.insert_module(module))
    }

    fn update_module(&self, id: ModuleId, update: CatalogEntryUpdate) -> StoreResult<Module> {
        self.mutate(|s| s.update_module(id, update))
    }

    fn delete_module(&self, id: ModuleId) -> StoreResult<()> {
        self.mutate(|s| s.delete_module(id))
    }

    fn find_module(&self, id: ModuleId) -> StoreResult<Option<Module>> {
        Ok(self.read()?.modules.get(&id).cloned())
    }

    fn find_module_by_code(&self, code: &str) -> StoreResult<Option<Module>> {
        let state = self.read()?;
        Ok(state
            .module_codes
            .get(code)
            .and_then(|id| state.modules.get(id))
            .cloned())
    }

    fn list_modules(&self) -> StoreResult<Vec<Module>> {
        Ok(self.read()?.modules.values().cloned().collect())
    }

    fn insert_action(&self, action: NewAction) -> StoreResult<Action> {
        self.mutate(|s| s.insert_action(action))
    }

    fn update_action(&self, id: ActionId, update: CatalogEntryUpdate) -> StoreResult<Action> {
        self.mutate(|s| s.update_action(id, update))
    }

    fn delete_action(&self, id: ActionId) -> StoreResult<()> {
        self.mutate(|s| s.delete_action(id))
    }

    fn find_action(&self, id: ActionId) -> StoreResult<Option<Action>> {
        Ok(self.read()?.actions.get(&id).cloned())
    }

    fn find_action_by_code(&self, code: &str) -> StoreResult<Option<Action>> {
        let state = self.read()?;
        Ok(state
            .action_codes
            .get(code)
            .and_then(|id| state.actions.get(id))
            .cloned())
    }

    fn list_actions(&self) -> StoreResult<Vec<Action>> {
        Ok(self.read()?.actions.values().cloned().collect())
    }

    fn insert_permission(&self, permission: NewPermission) -> StoreResult<Permission> {
        self.mutate(|s| s.insert_permission(permission))
    }

    fn update_permission_label(
        &self,
        id: PermissionId,
        label: String,
    ) -> StoreResult<Permission> {
        self.mutate(|s| s.update_permission_label(id, label))
    }

    fn delete_permission(&self, id: PermissionId) -> StoreResult<()> {
        self.mutate(|s| s.delete_permission(id))
    }

    fn find_permission(&self, id: PermissionId) -> StoreResult<Option<Permission>> {
        Ok(self.read()?.permissions.get(&id).cloned())
    }

    fn find_permission_by_key(&self, key: &str) -> StoreResult<Option<Permission>> {
        let state = self.read()?;
        Ok(state
            .permission_keys
            .get(key)
            .and_then(|id| state.permissions.get(id))
            .cloned())
    }

    fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.read()?.permissions.values().cloned().collect())
    }

    fn missing_permissions(&self, ids: &[PermissionId]) -> StoreResult<Vec<PermissionId>> {
        let state = self.read()?;
        let mut missing: Vec<PermissionId> = ids
            .iter()
            .filter(|id| !state.permissions.contains_key(id))
            .copied()
            .collect();
        missing.sort();
        missing.dedup();
        Ok(missing)
    }

    fn insert_role(&self, role: NewRole) -> StoreResult<Role> {
        self.mutate(|s| s.insert_role(role))
    }

    fn update_role(&self, id: RoleId, update: RoleUpdate) -> StoreResult<Role> {
        self.mutate(|s| s.update_role(id, update))
    }

    fn delete_role(&self, id: RoleId) -> StoreResult<()> {
        self.mutate(|s| s.delete_role(id))
    }

    fn find_role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let state = self.read()?;
        Ok(state
            .role_names
            .get(name)
            .and_then(|id| state.roles.get(id))
            .cloned())
    }

    fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    fn insert_principal(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        self.mutate(|s| s.insert_principal(principal))
    }

    fn update_principal(
        &self,
        id: PrincipalId,
        update: PrincipalUpdate,
    ) -> StoreResult<Principal> {
        self.mutate(|s| s.update_principal(id, update))
    }

    fn find_principal(&self, id: PrincipalId) -> StoreResult<Option<Principal>> {
        Ok(self.read()?.principals.get(&id).cloned())
    }

    fn list_principals(&self) -> StoreResult<Vec<Principal>> {
        Ok(self.read()?.principals.values().cloned().collect())
    }

    fn assigned_permission_ids(&self, role_id: RoleId) -> StoreResult<Vec<PermissionId>> {
        Ok(AssignmentTransaction::assigned_permission_ids(
            &*self.read()?,
            role_id,
        ))
    }

    fn grant_rows(&self, role_id: RoleId) -> StoreResult<Vec<GrantRow>> {
        self.read()?.grant_rows(role_id)
    }

    fn role_has_permission(
        &self,
        role_id: RoleId,
        module_code: &str,
        action_code: &str,
    ) -> StoreResult<bool> {
        Ok(self
            .read()?
            .role_has_permission(role_id, module_code, action_code))
    }

    fn transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn AssignmentTransaction) -> StoreResult<T>,
    {
        self.mutate(|state| f(state))
    }
}
