//! AuthorizationGate - Per-request permission check
//!
//! Every protected operation declares the `(module, action)` it needs and
//! runs behind the gate. The gate is a pure read: one principal lookup and
//! one indexed existence check on `(role, module code, action code)`.
//!
//! ## Failure mapping
//!
//! | Situation                                   | Error             |
//! |---------------------------------------------|-------------------|
//! | no principal id in the request              | `Unauthenticated` |
//! | principal unknown or inactive               | `Unauthenticated` |
//! | no role, inactive role, missing permission  | `Forbidden`       |
//! | unknown module/action code                  | `Forbidden`       |
//! | store failure                               | `Forbidden`       |
//!
//! Nothing else escapes `authorize`.

use std::fmt;
use std::sync::Arc;

use shared::{AccessError, Principal, PrincipalId, Result};
use tracing::{debug, error, info};

use crate::store::AccessStore;

/// Per-request state the gate reads from and writes to
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal_id: Option<PrincipalId>,
    principal: Option<Principal>,
}

impl RequestContext {
    /// A request carrying no principal identifier
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A request made by an already-authenticated principal
    pub fn for_principal(principal_id: PrincipalId) -> Self {
        Self {
            principal_id: Some(principal_id),
            principal: None,
        }
    }

    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.principal_id
    }

    /// The principal resolved by the last successful `authorize`
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

/// The permission a protected operation declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequiredPermission {
    pub module: &'static str,
    pub action: &'static str,
}

impl RequiredPermission {
    pub const fn new(module: &'static str, action: &'static str) -> Self {
        Self { module, action }
    }

    pub fn key(&self) -> String {
        shared::Permission::key_for(self.module, self.action)
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

#[derive(Debug)]
pub struct AuthorizationGate<S> {
    store: Arc<S>,
}

impl<S> Clone for AuthorizationGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> AuthorizationGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check a principal against `module.action` without touching a context.
    ///
    /// Returns the resolved principal on success.
    pub fn check(
        &self,
        principal_id: Option<PrincipalId>,
        module: &str,
        action: &str,
    ) -> Result<Principal> {
        let Some(principal_id) = principal_id else {
            debug!(module, action, "denied: no principal identifier");
            return Err(AccessError::Unauthenticated(
                "Authentication required".to_string(),
            ));
        };

        let principal = match self.store.find_principal(principal_id) {
            Ok(Some(principal)) if principal.is_active() => principal,
            Ok(Some(_)) => {
                info!(principal_id = %principal_id, "denied: principal inactive");
                return Err(AccessError::Unauthenticated(format!(
                    "Principal '{}' is inactive",
                    principal_id
                )));
            }
            Ok(None) => {
                info!(principal_id = %principal_id, "denied: unknown principal");
                return Err(AccessError::Unauthenticated(format!(
                    "Principal '{}' does not exist",
                    principal_id
                )));
            }
            Err(err) => {
                error!(principal_id = %principal_id, error = %err, "principal lookup failed");
                return Err(forbidden(module, action));
            }
        };

        let Some(role_id) = principal.role_id else {
            info!(principal_id = %principal_id, module, action, "denied: no role");
            return Err(forbidden(module, action));
        };

        match self.store.role_has_permission(role_id, module, action) {
            Ok(true) => {
                debug!(principal_id = %principal_id, role_id = %role_id, module, action, "granted");
                Ok(principal)
            }
            Ok(false) => {
                info!(
                    principal_id = %principal_id,
                    role_id = %role_id,
                    module,
                    action,
                    "denied: permission not held"
                );
                Err(forbidden(module, action))
            }
            Err(err) => {
                error!(role_id = %role_id, error = %err, "permission lookup failed");
                Err(forbidden(module, action))
            }
        }
    }

    /// Authorize the request in `ctx` for `module.action`.
    ///
    /// On success the resolved principal is attached to the context. On
    /// failure the context is left unresolved.
    pub fn authorize(&self, ctx: &mut RequestContext, module: &str, action: &str) -> Result<()> {
        ctx.principal = None;
        let principal = self.check(ctx.principal_id, module, action)?;
        ctx.principal = Some(principal);
        Ok(())
    }

    /// Run `op` only if the request holds `required`
    pub fn guard<T, F>(&self, ctx: &mut RequestContext, required: RequiredPermission, op: F) -> Result<T>
    where
        F: FnOnce(&Principal) -> Result<T>,
    {
        self.authorize(ctx, required.module, required.action)?;
        match ctx.principal() {
            Some(principal) => op(principal),
            None => Err(forbidden(required.module, required.action)),
        }
    }
}

fn forbidden(module: &str, action: &str) -> AccessError {
    AccessError::Forbidden(format!("Missing permission '{}.{}'", module, action))
}
