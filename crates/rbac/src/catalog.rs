//! CatalogManager - Modules, actions and the permissions pairing them
//!
//! Codes are validated here; uniqueness, foreign keys and delete
//! restrictions are enforced by the store and surfaced as `Conflict`,
//! `NotFound` or `Validation`.

use std::sync::Arc;

use shared::{
    AccessError, Action, ActionId, CatalogEntryUpdate, Module, ModuleId, NewAction, NewModule,
    NewPermission, Permission, PermissionId, Result,
};
use tracing::info;

use crate::store::{AccessStore, StoreError};

const CODE_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Lowercase ASCII token without dots, so permission keys split unambiguously
pub fn is_valid_code(code: &str) -> bool {
    regex::Regex::new(CODE_PATTERN)
        .map(|r| r.is_match(code))
        .unwrap_or(false)
}

fn validate_code(entity: &str, code: &str) -> Result<()> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(AccessError::Validation(format!(
            "{} code '{}' must be a lowercase token ([a-z][a-z0-9_]*)",
            entity, code
        )))
    }
}

fn validate_title(entity: &str, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        Err(AccessError::Validation(format!("{} title must not be empty", entity)))
    } else {
        Ok(())
    }
}

/// Map a failed permission insert: missing module/action is `NotFound`
fn permission_insert_error(err: StoreError) -> AccessError {
    match err {
        StoreError::ForeignKeyViolation { constraint, id } if constraint.ends_with("module_id") => {
            AccessError::not_found("Module", id)
        }
        StoreError::ForeignKeyViolation { constraint, id } if constraint.ends_with("action_id") => {
            AccessError::not_found("Action", id)
        }
        other => other.into(),
    }
}

/// Owns Module, Action and Permission records
#[derive(Debug)]
pub struct CatalogManager<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccessStore> CatalogManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ============== Modules ==============

    pub fn create_module(&self, module: NewModule) -> Result<Module> {
        validate_code("Module", &module.code)?;
        validate_title("Module", &module.title)?;
        let module = self.store.insert_module(module)?;
        info!(module_id = %module.id, code = %module.code, "module created");
        Ok(module)
    }

    /// Update a module. Renaming the code recomputes the keys of every
    /// permission built on it.
    pub fn update_module(&self, id: ModuleId, update: CatalogEntryUpdate) -> Result<Module> {
        if let Some(code) = &update.code {
            validate_code("Module", code)?;
        }
        if let Some(title) = &update.title {
            validate_title("Module", title)?;
        }
        let module = self.store.update_module(id, update)?;
        info!(module_id = %module.id, code = %module.code, "module updated");
        Ok(module)
    }

    /// Delete a module. Fails with `Conflict` while permissions reference it.
    pub fn delete_module(&self, id: ModuleId) -> Result<()> {
        self.store.delete_module(id)?;
        info!(module_id = %id, "module deleted");
        Ok(())
    }

    pub fn get_module(&self, id: ModuleId) -> Result<Module> {
        self.store
            .find_module(id)?
            .ok_or_else(|| AccessError::not_found("Module", id))
    }

    pub fn find_module_by_code(&self, code: &str) -> Result<Option<Module>> {
        Ok(self.store.find_module_by_code(code)?)
    }

    pub fn list_modules(&self) -> Result<Vec<Module>> {
        Ok(self.store.list_modules()?)
    }

    // ============== Actions ==============

    pub fn create_action(&self, action: NewAction) -> Result<Action> {
        validate_code("Action", &action.code)?;
        validate_title("Action", &action.title)?;
        let action = self.store.insert_action(action)?;
        info!(action_id = %action.id, code = %action.code, "action created");
        Ok(action)
    }

    /// Update an action. Renaming the code recomputes the keys of every
    /// permission built on it.
    pub fn update_action(&self, id: ActionId, update: CatalogEntryUpdate) -> Result<Action> {
        if let Some(code) = &update.code {
            validate_code("Action", code)?;
        }
        if let Some(title) = &update.title {
            validate_title("Action", title)?;
        }
        let action = self.store.update_action(id, update)?;
        info!(action_id = %action.id, code = %action.code, "action updated");
        Ok(action)
    }

    /// Delete an action. Fails with `Conflict` while permissions reference it.
    pub fn delete_action(&self, id: ActionId) -> Result<()> {
        self.store.delete_action(id)?;
        info!(action_id = %id, "action deleted");
        Ok(())
    }

    pub fn get_action(&self, id: ActionId) -> Result<Action> {
        self.store
            .find_action(id)?
            .ok_or_else(|| AccessError::not_found("Action", id))
    }

    pub fn find_action_by_code(&self, code: &str) -> Result<Option<Action>> {
        Ok(self.store.find_action_by_code(code)?)
    }

    pub fn list_actions(&self) -> Result<Vec<Action>> {
        Ok(self.store.list_actions()?)
    }

    // ============== Permissions ==============

    /// Create the permission pairing a module and an action.
    ///
    /// The key is derived as `<module.code>.<action.code>`. An empty label
    /// defaults to `"<Module title> - <Action title>"`.
    pub fn create_permission(&self, mut permission: NewPermission) -> Result<Permission> {
        if permission.label.trim().is_empty() {
            let module = self.get_module(permission.module_id)?;
            let action = self.get_action(permission.action_id)?;
            permission.label = format!("{} - {}", module.title, action.title);
        }
        let permission = self
            .store
            .insert_permission(permission)
            .map_err(permission_insert_error)?;
        info!(
            permission_id = %permission.id,
            key = %permission.permission_key,
            "permission created"
        );
        Ok(permission)
    }

    /// Create a permission addressed by module and action codes
    pub fn create_permission_by_codes(
        &self,
        module_code: &str,
        action_code: &str,
        label: impl Into<String>,
    ) -> Result<Permission> {
        let module = self
            .find_module_by_code(module_code)?
            .ok_or_else(|| AccessError::not_found("Module", module_code))?;
        let action = self
            .find_action_by_code(action_code)?
            .ok_or_else(|| AccessError::not_found("Action", action_code))?;
        self.create_permission(NewPermission {
            module_id: module.id,
            action_id: action.id,
            label: label.into(),
        })
    }

    /// Relabel a permission. Module, action and key are immutable.
    pub fn update_permission_label(
        &self,
        id: PermissionId,
        label: impl Into<String>,
    ) -> Result<Permission> {
        let label = label.into();
        validate_title("Permission", &label)?;
        Ok(self.store.update_permission_label(id, label)?)
    }

    /// Delete a permission. Fails with `Conflict` while any role holds it.
    pub fn delete_permission(&self, id: PermissionId) -> Result<()> {
        self.store.delete_permission(id)?;
        info!(permission_id = %id, "permission deleted");
        Ok(())
    }

    pub fn get_permission(&self, id: PermissionId) -> Result<Permission> {
        self.store
            .find_permission(id)?
            .ok_or_else(|| AccessError::not_found("Permission", id))
    }

    pub fn find_permission_by_key(&self, key: &str) -> Result<Option<Permission>> {
        Ok(self.store.find_permission_by_key(key)?)
    }

    pub fn list_permissions(&self) -> Result<Vec<Permission>> {
        Ok(self.store.list_permissions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::ErrorKind;

    fn catalog() -> CatalogManager<MemoryStore> {
        CatalogManager::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_create_permission_derives_key() {
        let catalog = catalog();
        let users = catalog.create_module(NewModule::new("users", "Users")).unwrap();
        let view = catalog.create_action(NewAction::new("view", "View")).unwrap();

        let permission = catalog
            .create_permission(NewPermission {
                module_id: users.id,
                action_id: view.id,
                label: String::new(),
            })
            .unwrap();

        assert_eq!(permission.permission_key, "users.view");
        assert_eq!(permission.label, "Users - View");
    }

    #[test]
    fn test_duplicate_permission_key_conflicts() {
        let catalog = catalog();
        catalog.create_module(NewModule::new("users", "Users")).unwrap();
        catalog.create_action(NewAction::new("view", "View")).unwrap();
        catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();

        let err = catalog
            .create_permission_by_codes("users", "view", "Again")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_permission_requires_existing_module_and_action() {
        let catalog = catalog();
        let view = catalog.create_action(NewAction::new("view", "View")).unwrap();

        let err = catalog
            .create_permission(NewPermission {
                module_id: ModuleId::new(42),
                action_id: view.id,
                label: "Orphan".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, AccessError::not_found("Module", 42));

        let users = catalog.create_module(NewModule::new("users", "Users")).unwrap();
        let err = catalog
            .create_permission(NewPermission {
                module_id: users.id,
                action_id: ActionId::new(42),
                label: "Orphan".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, AccessError::not_found("Action", 42));
    }

    #[test]
    fn test_duplicate_module_code_conflicts() {
        let catalog = catalog();
        catalog.create_module(NewModule::new("users", "Users")).unwrap();
        let err = catalog
            .create_module(NewModule::new("users", "People"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_delete_module_in_use_conflicts() {
        let catalog = catalog();
        let users = catalog.create_module(NewModule::new("users", "Users")).unwrap();
        catalog.create_action(NewAction::new("view", "View")).unwrap();
        let permission = catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();

        let err = catalog.delete_module(users.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        catalog.delete_permission(permission.id).unwrap();
        catalog.delete_module(users.id).unwrap();
        assert!(catalog.find_module_by_code("users").unwrap().is_none());
    }

    #[test]
    fn test_delete_action_in_use_conflicts() {
        let catalog = catalog();
        catalog.create_module(NewModule::new("users", "Users")).unwrap();
        let view = catalog.create_action(NewAction::new("view", "View")).unwrap();
        let permission = catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();

        let err = catalog.delete_action(view.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(catalog.get_action(view.id).unwrap(), view);
        assert_eq!(catalog.get_permission(permission.id).unwrap(), permission);
    }

    #[test]
    fn test_rename_to_taken_code_conflicts() {
        let catalog = catalog();
        let users = catalog.create_module(NewModule::new("users", "Users")).unwrap();
        catalog.create_module(NewModule::new("zones", "Zones")).unwrap();
        let view = catalog.create_action(NewAction::new("view", "View")).unwrap();
        catalog.create_action(NewAction::new("edit", "Edit")).unwrap();
        catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();
        let keys_before: Vec<String> = catalog
            .list_permissions()
            .unwrap()
            .into_iter()
            .map(|p| p.permission_key)
            .collect();

        let err = catalog
            .update_module(
                users.id,
                CatalogEntryUpdate {
                    code: Some("zones".to_string()),
                    title: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = catalog
            .update_action(
                view.id,
                CatalogEntryUpdate {
                    code: Some("edit".to_string()),
                    title: Some("Edit".to_string()),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let keys_after: Vec<String> = catalog
            .list_permissions()
            .unwrap()
            .into_iter()
            .map(|p| p.permission_key)
            .collect();
        assert_eq!(keys_after, keys_before);
        assert_eq!(catalog.get_module(users.id).unwrap().code, "users");
        assert_eq!(catalog.get_action(view.id).unwrap().title, "View");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let catalog = catalog();
        assert_eq!(
            catalog.delete_action(ActionId::new(9)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            catalog.delete_permission(PermissionId::new(9)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_rename_module_keeps_keys_current() {
        let catalog = catalog();
        let users = catalog.create_module(NewModule::new("users", "Users")).unwrap();
        catalog.create_action(NewAction::new("view", "View")).unwrap();
        let permission = catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();

        catalog
            .update_module(
                users.id,
                CatalogEntryUpdate {
                    code: Some("members".to_string()),
                    title: Some("Members".to_string()),
                },
            )
            .unwrap();

        let renamed = catalog.get_permission(permission.id).unwrap();
        assert_eq!(renamed.permission_key, "members.view");
        assert!(catalog.find_permission_by_key("users.view").unwrap().is_none());
    }

    #[test]
    fn test_relabel_permission() {
        let catalog = catalog();
        catalog.create_module(NewModule::new("users", "Users")).unwrap();
        catalog.create_action(NewAction::new("view", "View")).unwrap();
        let permission = catalog
            .create_permission_by_codes("users", "view", "View users")
            .unwrap();

        let relabeled = catalog
            .update_permission_label(permission.id, "Browse users")
            .unwrap();
        assert_eq!(relabeled.label, "Browse users");
        assert_eq!(relabeled.permission_key, "users.view");
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_invalid_codes_rejected() {
            let catalog = catalog();
            for code in ["", "Users", "users.view", "1users", "users view", "users-x"] {
                let err = catalog
                    .create_module(NewModule::new(code, "Title"))
                    .unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Validation, "code {:?}", code);
            }
        }

        #[test]
        fn test_code_pattern_compiles() {
            assert!(regex::Regex::new(CODE_PATTERN).is_ok());
        }

        #[test]
        fn test_valid_codes_accepted() {
            assert!(is_valid_code("users"));
            assert!(is_valid_code("sub_zones2"));
        }

        #[test]
        fn test_rename_to_invalid_code_rejected() {
            let catalog = catalog();
            let view = catalog.create_action(NewAction::new("view", "View")).unwrap();
            let err = catalog
                .update_action(
                    view.id,
                    CatalogEntryUpdate {
                        code: Some("view.all".to_string()),
                        title: None,
                    },
                )
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(catalog.get_action(view.id).unwrap().code, "view");
        }

        #[test]
        fn test_blank_title_rejected() {
            let catalog = catalog();
            let err = catalog
                .create_action(NewAction::new("view", "   "))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }
}
