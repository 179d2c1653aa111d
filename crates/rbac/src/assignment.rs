//! AssignmentSynchronizer - Wholesale replacement of a role's permissions
//!
//! A role's assignments are never edited one row at a time. Saving a role's
//! permission checklist replaces the whole set in one store transaction:
//! delete every row of the role, insert one row per requested permission.
//!
//! ## Concurrency
//!
//! Readers observe the set before or after a replace, never in between.
//! Two replaces on the same role are NOT serialized by the application:
//! the later commit determines the final set (last-writer-wins). Writes
//! are rare and human-driven, so this tradeoff is accepted.

use std::sync::Arc;

use shared::{AccessError, PermissionId, Result, RoleId, UnknownPermissionsError};
use tracing::{info, warn};

use crate::store::{AccessStore, StoreError};

/// Replaces the set of permissions granted to a role
#[derive(Debug)]
pub struct AssignmentSynchronizer<S> {
    store: Arc<S>,
}

impl<S> Clone for AssignmentSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> AssignmentSynchronizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn ensure_role(&self, role_id: RoleId) -> Result<()> {
        match self.store.find_role(role_id)? {
            Some(_) => Ok(()),
            None => Err(AccessError::not_found("Role", role_id)),
        }
    }

    /// Permission ids currently granted to a role, ascending
    pub fn role_permission_ids(&self, role_id: RoleId) -> Result<Vec<PermissionId>> {
        self.ensure_role(role_id)?;
        Ok(self.store.assigned_permission_ids(role_id)?)
    }

    /// Replace every permission of a role with `permission_ids`.
    ///
    /// Duplicate ids are collapsed. Returns the final set, ascending.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the role does not exist
    /// - `Validation` naming every unknown id; nothing is applied
    /// - `Validation` or `Internal` if the transaction fails; the previous
    ///   set is left exactly as it was
    pub fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<Vec<PermissionId>> {
        self.ensure_role(role_id)?;

        let mut requested = permission_ids.to_vec();
        requested.sort();
        requested.dedup();

        let missing = self.store.missing_permissions(&requested)?;
        if !missing.is_empty() {
            warn!(
                role_id = %role_id,
                unknown = ?missing,
                "rejected permission replace with unknown ids"
            );
            return Err(unknown_permissions(role_id, missing));
        }

        self.apply(role_id, &requested)
    }

    /// Replace a role's permissions, addressing them by `module.action` key
    pub fn replace_role_permissions_by_keys<K: AsRef<str>>(
        &self,
        role_id: RoleId,
        keys: &[K],
    ) -> Result<Vec<PermissionId>> {
        let mut ids = Vec::with_capacity(keys.len());
        let mut unknown = Vec::new();
        for key in keys {
            match self.store.find_permission_by_key(key.as_ref())? {
                Some(permission) => ids.push(permission.id),
                None => unknown.push(key.as_ref().to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(AccessError::Validation(format!(
                "Unknown permission keys for role '{}': {}",
                role_id,
                unknown.join(", ")
            )));
        }
        self.replace_role_permissions(role_id, &ids)
    }

    /// Delete-then-insert inside one transaction. `requested` is sorted and
    /// deduplicated.
    fn apply(&self, role_id: RoleId, requested: &[PermissionId]) -> Result<Vec<PermissionId>> {
        let outcome = self.store.transaction(|tx| {
            let removed = tx.delete_assignments_for_role(role_id)?;
            for permission_id in requested {
                tx.insert_assignment(role_id, *permission_id)?;
            }
            Ok((removed, tx.assigned_permission_ids(role_id)))
        });

        match outcome {
            Ok((removed, final_set)) => {
                info!(
                    role_id = %role_id,
                    removed,
                    granted = final_set.len(),
                    "role permissions replaced"
                );
                Ok(final_set)
            }
            Err(err) => {
                warn!(role_id = %role_id, error = %err, "role permission replace rolled back");
                Err(self.rollback_error(role_id, requested, err))
            }
        }
    }

    /// Classify a failed transaction. A permission deleted between
    /// validation and commit is a `Validation` failure; a role deleted
    /// meanwhile is `NotFound`; anything else is `Internal`.
    fn rollback_error(
        &self,
        role_id: RoleId,
        requested: &[PermissionId],
        err: StoreError,
    ) -> AccessError {
        match err {
            StoreError::ForeignKeyViolation { constraint, id }
                if constraint == "role_assignments.permission_id" =>
            {
                let missing = self
                    .store
                    .missing_permissions(requested)
                    .ok()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| vec![PermissionId::new(id)]);
                unknown_permissions(role_id, missing)
            }
            StoreError::ForeignKeyViolation { constraint, .. }
                if constraint == "role_assignments.role_id" =>
            {
                AccessError::not_found("Role", role_id)
            }
            other => AccessError::Internal(other.to_string()),
        }
    }
}

fn unknown_permissions(role_id: RoleId, missing: Vec<PermissionId>) -> AccessError {
    UnknownPermissionsError {
        role_id: role_id.get(),
        unknown_ids: missing.into_iter().map(PermissionId::get).collect(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::{ErrorKind, NewAction, NewModule, NewPermission, NewRole};

    fn ids(raw: &[u64]) -> Vec<PermissionId> {
        raw.iter().copied().map(PermissionId::new).collect()
    }

    /// Three permissions (ids 1..=3) and roles up to id 5
    fn setup() -> (Arc<MemoryStore>, AssignmentSynchronizer<MemoryStore>, RoleId) {
        let store = Arc::new(MemoryStore::new());
        let users = store.insert_module(NewModule::new("users", "Users")).unwrap();
        for code in ["view", "edit", "delete"] {
            let action = store.insert_action(NewAction::new(code, code)).unwrap();
            store
                .insert_permission(NewPermission {
                    module_id: users.id,
                    action_id: action.id,
                    label: code.to_string(),
                })
                .unwrap();
        }
        let mut role = None;
        for name in ["admin", "viewer", "auditor", "guest", "editor"] {
            role = Some(store.insert_role(NewRole::new(name)).unwrap());
        }
        let role_id = role.map(|r| r.id).unwrap();
        assert_eq!(role_id, RoleId::new(5));

        (store.clone(), AssignmentSynchronizer::new(store), role_id)
    }

    #[test]
    fn test_replace_swaps_set() {
        let (_, sync, role) = setup();
        sync.replace_role_permissions(role, &ids(&[1, 2])).unwrap();

        let final_set = sync.replace_role_permissions(role, &ids(&[2, 3])).unwrap();

        assert_eq!(final_set, ids(&[2, 3]));
        assert_eq!(sync.role_permission_ids(role).unwrap(), ids(&[2, 3]));
    }

    #[test]
    fn test_unknown_id_applies_nothing() {
        let (_, sync, role) = setup();
        sync.replace_role_permissions(role, &ids(&[1, 2])).unwrap();

        let err = sync
            .replace_role_permissions(role, &ids(&[2, 3, 999]))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err,
            AccessError::UnknownPermissions(UnknownPermissionsError {
                role_id: 5,
                unknown_ids: vec![999],
            })
        );
        assert_eq!(sync.role_permission_ids(role).unwrap(), ids(&[1, 2]));
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (_, sync, role) = setup();
        let first = sync.replace_role_permissions(role, &ids(&[3, 1])).unwrap();
        let second = sync.replace_role_permissions(role, &ids(&[3, 1])).unwrap();

        assert_eq!(first, ids(&[1, 3]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_set_clears_role() {
        let (_, sync, role) = setup();
        sync.replace_role_permissions(role, &ids(&[1, 2, 3])).unwrap();

        let final_set = sync.replace_role_permissions(role, &[]).unwrap();
        assert!(final_set.is_empty());
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let (_, sync, role) = setup();
        let final_set = sync
            .replace_role_permissions(role, &ids(&[2, 2, 1, 2]))
            .unwrap();
        assert_eq!(final_set, ids(&[1, 2]));
    }

    #[test]
    fn test_unknown_role_not_found() {
        let (_, sync, _) = setup();
        let err = sync
            .replace_role_permissions(RoleId::new(77), &ids(&[1]))
            .unwrap_err();
        assert_eq!(err, AccessError::not_found("Role", 77));
        assert_eq!(
            sync.role_permission_ids(RoleId::new(77)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_replace_does_not_touch_other_roles() {
        let (_, sync, role) = setup();
        let other = RoleId::new(1);
        sync.replace_role_permissions(other, &ids(&[3])).unwrap();

        sync.replace_role_permissions(role, &ids(&[1, 2])).unwrap();
        sync.replace_role_permissions(role, &[]).unwrap();

        assert_eq!(sync.role_permission_ids(other).unwrap(), ids(&[3]));
    }

    #[test]
    fn test_replace_by_keys() {
        let (_, sync, role) = setup();
        let final_set = sync
            .replace_role_permissions_by_keys(role, &["users.view", "users.delete"])
            .unwrap();
        assert_eq!(final_set, ids(&[1, 3]));

        let err = sync
            .replace_role_permissions_by_keys(role, &["users.view", "users.fly"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("users.fly"));
        assert_eq!(sync.role_permission_ids(role).unwrap(), ids(&[1, 3]));
    }

    #[test]
    fn test_permission_vanishing_mid_transaction_rolls_back() {
        let (_, sync, role) = setup();
        sync.replace_role_permissions(role, &ids(&[1, 2])).unwrap();

        // Validation passed for 3 and 404, then 404 vanished before commit
        let err = sync.apply(role, &ids(&[3, 404])).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("404"));
        assert_eq!(sync.role_permission_ids(role).unwrap(), ids(&[1, 2]));
    }

    #[test]
    fn test_concurrent_replace_last_writer_wins() {
        let (_, sync, role) = setup();
        let left = ids(&[1]);
        let right = ids(&[2, 3]);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| sync.replace_role_permissions(role, &left).unwrap());
                scope.spawn(|| sync.replace_role_permissions(role, &right).unwrap());
            }
        });

        let final_set = sync.role_permission_ids(role).unwrap();
        assert!(final_set == left || final_set == right, "mixed set {:?}", final_set);
    }
}
