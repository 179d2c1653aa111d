//! Access tree - the effective permission set of a role, grouped by module
//!
//! This is the structure embedded verbatim in the login response.

use crate::catalog::Permission;
use crate::role::Principal;
use serde::{Deserialize, Serialize};

/// One action granted within a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAccess {
    pub action_code: String,
    pub action_title: String,
}

/// All actions a role holds on one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccess {
    pub module_code: String,
    pub module_title: String,
    pub actions: Vec<ActionAccess>,
}

impl ModuleAccess {
    /// Permission keys covered by this module entry
    pub fn permission_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.actions
            .iter()
            .map(|a| Permission::key_for(&self.module_code, &a.action_code))
    }
}

/// Ordered by module id, then action id
pub type AccessTree = Vec<ModuleAccess>;

/// Flatten an access tree into permission keys, preserving tree order
pub fn access_tree_keys(tree: &[ModuleAccess]) -> Vec<String> {
    tree.iter().flat_map(|m| m.permission_keys()).collect()
}

/// Response of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub principal: Principal,
    pub access: AccessTree,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_tree_keys() {
        let tree = vec![
            ModuleAccess {
                module_code: "users".to_string(),
                module_title: "Users".to_string(),
                actions: vec![
                    ActionAccess {
                        action_code: "view".to_string(),
                        action_title: "View".to_string(),
                    },
                    ActionAccess {
                        action_code: "edit".to_string(),
                        action_title: "Edit".to_string(),
                    },
                ],
            },
            ModuleAccess {
                module_code: "zones".to_string(),
                module_title: "Zones".to_string(),
                actions: vec![ActionAccess {
                    action_code: "view".to_string(),
                    action_title: "View".to_string(),
                }],
            },
        ];

        assert_eq!(
            access_tree_keys(&tree),
            vec!["users.view", "users.edit", "zones.view"]
        );
    }
}
