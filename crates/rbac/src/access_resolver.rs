//! AccessResolver - Full permission tree of a role
//!
//! Used at login (the tree is embedded in the login response) and for
//! auditing what a role can do.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared::{
    AccessError, AccessTree, ActionAccess, ActionId, Module, ModuleAccess, ModuleId, Result,
    RoleId,
};

use crate::store::AccessStore;

#[derive(Debug)]
pub struct AccessResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for AccessResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> AccessResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Group a role's grants by module.
    ///
    /// Modules are ordered by id, actions within a module by id. A role
    /// without assignments yields an empty tree; an unknown role is
    /// `NotFound`.
    pub fn compute_access_tree(&self, role_id: RoleId) -> Result<AccessTree> {
        if self.store.find_role(role_id)?.is_none() {
            return Err(AccessError::not_found("Role", role_id));
        }

        let mut grouped: BTreeMap<ModuleId, (Module, BTreeMap<ActionId, ActionAccess>)> =
            BTreeMap::new();
        for row in self.store.grant_rows(role_id)? {
            let (_, actions) = grouped
                .entry(row.module.id)
                .or_insert_with(|| (row.module.clone(), BTreeMap::new()));
            actions.insert(
                row.action.id,
                ActionAccess {
                    action_code: row.action.code,
                    action_title: row.action.title,
                },
            );
        }

        Ok(grouped
            .into_values()
            .map(|(module, actions)| ModuleAccess {
                module_code: module.code,
                module_title: module.title,
                actions: actions.into_values().collect(),
            })
            .collect())
    }

    /// Permission keys a role holds, in tree order
    pub fn assigned_permission_keys(&self, role_id: RoleId) -> Result<Vec<String>> {
        Ok(shared::access_tree_keys(&self.compute_access_tree(role_id)?))
    }
}
