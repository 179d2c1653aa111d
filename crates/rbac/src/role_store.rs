//! RoleStore - Role definitions

use std::sync::Arc;

use shared::{AccessError, NewRole, Result, Role, RoleId, RoleUpdate};
use tracing::info;

use crate::store::AccessStore;

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(AccessError::Validation("Role name must not be empty".to_string()))
    } else {
        Ok(())
    }
}

/// Owns Role records
#[derive(Debug)]
pub struct RoleStore<S> {
    store: Arc<S>,
}

impl<S> Clone for RoleStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> RoleStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a role. A new role holds no permissions and denies everything.
    pub fn create_role(&self, role: NewRole) -> Result<Role> {
        validate_name(&role.name)?;
        let role = self.store.insert_role(role)?;
        info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Role> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        let role = self.store.update_role(id, update)?;
        info!(role_id = %role.id, name = %role.name, status = %role.status, "role updated");
        Ok(role)
    }

    /// Delete a role together with its assignments.
    ///
    /// Fails with `Conflict` while any principal holds the role.
    pub fn delete_role(&self, id: RoleId) -> Result<()> {
        self.store.delete_role(id)?;
        info!(role_id = %id, "role deleted");
        Ok(())
    }

    pub fn get_role(&self, id: RoleId) -> Result<Role> {
        self.store
            .find_role(id)?
            .ok_or_else(|| AccessError::not_found("Role", id))
    }

    pub fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.store.find_role_by_name(name)?)
    }

    pub fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.store.list_roles()?)
    }
}
