//! AccessControl - Central wiring of the RBAC engine
//!
//! Owns the store and one instance of every manager, and adds what the
//! managers do not know about: login, the audit trail and seeding.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use audit::{AuditEntry, AuditLogger, AuditStats};
use rbac::{
    AccessResolver, AccessStore, AssignmentSynchronizer, AuthorizationGate, CatalogManager,
    MemoryStore, PrincipalDirectory, RequestContext, RequiredPermission, RoleStore, StoreError,
};
use shared::{
    AccessError, AuditSettings, ConfigError, EngineConfig, LoginResponse, NewAction, NewModule,
    NewPrincipal, NewRole, PermissionId, Principal, PrincipalId, Result, RoleId,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::seed::{CatalogSeed, SeedReport};

/// Errors raised while building or persisting an engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Access(#[from] AccessError),
}

/// The RBAC engine
pub struct AccessControl<S: AccessStore = MemoryStore> {
    store: Arc<S>,
    catalog: CatalogManager<S>,
    roles: RoleStore<S>,
    principals: PrincipalDirectory<S>,
    assignments: AssignmentSynchronizer<S>,
    resolver: AccessResolver<S>,
    gate: AuthorizationGate<S>,
    audit: Mutex<AuditLogger>,
}

impl<S: AccessStore> AccessControl<S> {
    /// Wire every manager to `store`
    pub fn new(store: Arc<S>, audit: &AuditSettings) -> Self {
        Self {
            catalog: CatalogManager::new(store.clone()),
            roles: RoleStore::new(store.clone()),
            principals: PrincipalDirectory::new(store.clone()),
            assignments: AssignmentSynchronizer::new(store.clone()),
            resolver: AccessResolver::new(store.clone()),
            gate: AuthorizationGate::new(store.clone()),
            audit: Mutex::new(AuditLogger::from_settings(audit)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogManager<S> {
        &self.catalog
    }

    pub fn roles(&self) -> &RoleStore<S> {
        &self.roles
    }

    pub fn principals(&self) -> &PrincipalDirectory<S> {
        &self.principals
    }

    pub fn assignments(&self) -> &AssignmentSynchronizer<S> {
        &self.assignments
    }

    pub fn resolver(&self) -> &AccessResolver<S> {
        &self.resolver
    }

    pub fn gate(&self) -> &AuthorizationGate<S> {
        &self.gate
    }

    fn audit(&self) -> MutexGuard<'_, AuditLogger> {
        self.audit.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============== Login ==============

    /// Resolve a principal and compute its access snapshot.
    ///
    /// Unknown or inactive principals are `Unauthenticated`. A principal
    /// without a role, or whose role is inactive, logs in with an empty
    /// access tree.
    pub fn login(&self, principal_id: PrincipalId) -> Result<LoginResponse> {
        let outcome = self.resolve_login(principal_id);
        match &outcome {
            Ok(response) => {
                let granted = shared::access_tree_keys(&response.access).len();
                info!(principal_id = %principal_id, granted, "login");
                self.audit()
                    .log_login(principal_id, response.principal.role_id, granted, None);
            }
            Err(err) => {
                warn!(principal_id = %principal_id, error = %err, "login rejected");
                self.audit()
                    .log_login(principal_id, None, 0, Some(&err.to_string()));
            }
        }
        outcome
    }

    fn resolve_login(&self, principal_id: PrincipalId) -> Result<LoginResponse> {
        let principal = match self.store.find_principal(principal_id)? {
            Some(principal) if principal.is_active() => principal,
            Some(_) => {
                return Err(AccessError::Unauthenticated(format!(
                    "Principal '{}' is inactive",
                    principal_id
                )))
            }
            None => {
                return Err(AccessError::Unauthenticated(format!(
                    "Principal '{}' does not exist",
                    principal_id
                )))
            }
        };

        let access = match principal.role_id {
            Some(role_id) => match self.store.find_role(role_id)? {
                Some(role) if role.is_active() => self.resolver.compute_access_tree(role_id)?,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        Ok(LoginResponse { principal, access })
    }

    // ============== Authorization ==============

    /// Gate a request, recording the decision in the audit trail
    pub fn authorize(&self, ctx: &mut RequestContext, module: &str, action: &str) -> Result<()> {
        let outcome = self.gate.authorize(ctx, module, action);
        let key = shared::Permission::key_for(module, action);
        let denial = outcome.as_ref().err().map(|e| (e.kind(), e.to_string()));
        self.audit().log_decision(
            ctx.principal_id(),
            &key,
            denial.as_ref().map(|(kind, msg)| (*kind, msg.as_str())),
        );
        outcome
    }

    /// Run `op` only if the request holds `required`
    pub fn guard<T, F>(&self, ctx: &mut RequestContext, required: RequiredPermission, op: F) -> Result<T>
    where
        F: FnOnce(&Principal) -> Result<T>,
    {
        self.authorize(ctx, required.module, required.action)?;
        match ctx.principal() {
            Some(principal) => op(principal),
            None => Err(AccessError::Forbidden(format!("Missing permission '{}'", required))),
        }
    }

    // ============== Administration ==============

    /// Replace a role's permission set, recording the outcome
    pub fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<Vec<PermissionId>> {
        let outcome = self.assignments.replace_role_permissions(role_id, permission_ids);
        self.record_replace(role_id, &outcome);
        outcome
    }

    /// Replace a role's permission set by `module.action` keys
    pub fn replace_role_permissions_by_keys<K: AsRef<str>>(
        &self,
        role_id: RoleId,
        keys: &[K],
    ) -> Result<Vec<PermissionId>> {
        let outcome = self.assignments.replace_role_permissions_by_keys(role_id, keys);
        self.record_replace(role_id, &outcome);
        outcome
    }

    fn record_replace(&self, role_id: RoleId, outcome: &Result<Vec<PermissionId>>) {
        match outcome {
            Ok(final_set) => self
                .audit()
                .log_permissions_replaced(role_id, Ok(final_set.as_slice())),
            Err(err) => self
                .audit()
                .log_permissions_replaced(role_id, Err(&err.to_string())),
        }
    }

    /// Run a catalog edit and record it when it succeeds
    pub fn change_catalog<T, F>(&self, description: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&CatalogManager<S>) -> Result<T>,
    {
        let out = edit(&self.catalog)?;
        self.audit().log_catalog_change(description);
        Ok(out)
    }

    // ============== Seeding ==============

    /// Apply a seed through the managers.
    ///
    /// Stops at the first failing entry; earlier entries stay applied.
    pub fn apply_seed(&self, seed: &CatalogSeed) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for module in &seed.modules {
            self.change_catalog(&format!("create module '{}'", module.code), |c| {
                c.create_module(NewModule::new(&module.code, &module.title))
            })?;
            report.modules += 1;
        }
        for action in &seed.actions {
            self.change_catalog(&format!("create action '{}'", action.code), |c| {
                c.create_action(NewAction::new(&action.code, &action.title))
            })?;
            report.actions += 1;
        }
        for permission in &seed.permissions {
            let key = shared::Permission::key_for(&permission.module, &permission.action);
            self.change_catalog(&format!("create permission '{}'", key), |c| {
                c.create_permission_by_codes(
                    &permission.module,
                    &permission.action,
                    permission.label.clone(),
                )
            })?;
            report.permissions += 1;
        }
        for role in &seed.roles {
            let created = self.roles.create_role(
                NewRole::new(&role.name)
                    .with_description(&role.description)
                    .with_status(role.status),
            )?;
            self.replace_role_permissions_by_keys(created.id, role.permissions.as_slice())?;
            report.roles += 1;
        }
        for principal in &seed.principals {
            let role_id = match &principal.role {
                Some(name) => Some(
                    self.roles
                        .find_role_by_name(name)?
                        .ok_or_else(|| AccessError::not_found("Role", name))?
                        .id,
                ),
                None => None,
            };
            self.principals.create_principal(
                NewPrincipal::new(&principal.username, role_id).with_status(principal.status),
            )?;
            report.principals += 1;
        }

        info!(
            modules = report.modules,
            actions = report.actions,
            permissions = report.permissions,
            roles = report.roles,
            principals = report.principals,
            "seed applied"
        );
        Ok(report)
    }

    // ============== Audit ==============

    pub fn audit_stats(&self) -> AuditStats {
        self.audit().get_stats()
    }

    /// Most recent denials, newest first
    pub fn recent_denials(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit()
            .get_recent_denials(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn export_audit(&self) -> serde_json::Value {
        self.audit().export_json()
    }
}

impl AccessControl<MemoryStore> {
    /// Build an in-memory engine, applying the configured seed if any
    pub fn in_memory(config: &EngineConfig) -> std::result::Result<Self, EngineError> {
        let engine = Self::new(Arc::new(MemoryStore::new()), &config.audit);
        if let Some(seed) = &config.seed {
            engine.apply_seed(&CatalogSeed::from_file(seed)?)?;
        }
        Ok(engine)
    }

    /// Open a persisted state file, or start from the configured seed when
    /// the file does not exist yet
    pub fn open(state: &Path, config: &EngineConfig) -> std::result::Result<Self, EngineError> {
        if !state.exists() {
            return Self::in_memory(config);
        }
        let store = MemoryStore::load(state)?;
        info!(path = %state.display(), "state loaded");
        Ok(Self::new(Arc::new(store), &config.audit))
    }

    /// Persist the store as a JSON snapshot
    pub fn save(&self, state: &Path) -> std::result::Result<(), EngineError> {
        self.store.save(state)?;
        info!(path = %state.display(), "state saved");
        Ok(())
    }
}
