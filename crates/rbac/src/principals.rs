//! PrincipalDirectory - the slice of user accounts the engine needs
//!
//! Only identity, role and status live here; everything else about users
//! belongs to the user-management module.

use std::sync::Arc;

use shared::{
    AccessError, NewPrincipal, Principal, PrincipalId, PrincipalUpdate, RecordStatus, Result,
    RoleId,
};
use tracing::info;

use crate::store::{AccessStore, StoreError};

fn role_reference_error(err: StoreError) -> AccessError {
    match err {
        StoreError::ForeignKeyViolation { id, .. } => AccessError::not_found("Role", id),
        other => other.into(),
    }
}

#[derive(Debug)]
pub struct PrincipalDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for PrincipalDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> PrincipalDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_principal(&self, principal: NewPrincipal) -> Result<Principal> {
        if principal.username.trim().is_empty() {
            return Err(AccessError::Validation(
                "Username must not be empty".to_string(),
            ));
        }
        let principal = self
            .store
            .insert_principal(principal)
            .map_err(role_reference_error)?;
        info!(principal_id = %principal.id, username = %principal.username, "principal created");
        Ok(principal)
    }

    /// Assign or clear the principal's single role
    pub fn set_role(&self, id: PrincipalId, role_id: Option<RoleId>) -> Result<Principal> {
        let principal = self
            .store
            .update_principal(
                id,
                PrincipalUpdate {
                    role_id: Some(role_id),
                    status: None,
                },
            )
            .map_err(role_reference_error)?;
        info!(principal_id = %id, role_id = ?role_id, "principal role changed");
        Ok(principal)
    }

    pub fn set_status(&self, id: PrincipalId, status: RecordStatus) -> Result<Principal> {
        let principal = self.store.update_principal(
            id,
            PrincipalUpdate {
                role_id: None,
                status: Some(status),
            },
        )?;
        info!(principal_id = %id, status = %status, "principal status changed");
        Ok(principal)
    }

    pub fn get_principal(&self, id: PrincipalId) -> Result<Principal> {
        self.store
            .find_principal(id)?
            .ok_or_else(|| AccessError::not_found("Principal", id))
    }

    pub fn list_principals(&self) -> Result<Vec<Principal>> {
        Ok(self.store.list_principals()?)
    }
}
