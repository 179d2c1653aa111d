//! Permission catalog records

use crate::id::{ActionId, ModuleId, PermissionId};
use serde::{Deserialize, Serialize};

/// Separator between module and action codes in a permission key
pub const KEY_SEPARATOR: char = '.';

/// A functional area of the back office (e.g. "users")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    /// Unique lowercase token
    pub code: String,
    pub title: String,
}

/// An operation kind (e.g. "view", "edit")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    /// Unique token
    pub code: String,
    pub title: String,
}

/// One grantable capability: a module paired with an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub module_id: ModuleId,
    pub action_id: ActionId,
    /// Always `<module.code>.<action.code>`
    pub permission_key: String,
    pub label: String,
}

impl Permission {
    /// Derive the permission key for a module/action code pair
    pub fn key_for(module_code: &str, action_code: &str) -> String {
        format!("{}{}{}", module_code, KEY_SEPARATOR, action_code)
    }

    /// Split a permission key back into `(module_code, action_code)`.
    ///
    /// Returns `None` unless the key holds exactly one separator with
    /// non-empty codes on both sides.
    pub fn split_key(key: &str) -> Option<(&str, &str)> {
        let (module, action) = key.split_once(KEY_SEPARATOR)?;
        if module.is_empty() || action.is_empty() || action.contains(KEY_SEPARATOR) {
            return None;
        }
        Some((module, action))
    }
}

/// Input for creating a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModule {
    pub code: String,
    pub title: String,
}

impl NewModule {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }
}

/// Input for creating an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAction {
    pub code: String,
    pub title: String,
}

impl NewAction {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }
}

/// Input for creating a permission; the key is derived by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPermission {
    pub module_id: ModuleId,
    pub action_id: ActionId,
    #[serde(default)]
    pub label: String,
}

/// Partial update of a module or action. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntryUpdate {
    pub code: Option<String>,
    pub title: Option<String>,
}
