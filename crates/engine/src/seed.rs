//! CatalogSeed - Declarative bootstrap document
//!
//! ```yaml
//! modules:
//!   - { code: users, title: Users }
//! actions:
//!   - { code: view, title: View }
//! permissions:
//!   - { module: users, action: view }
//! roles:
//!   - name: viewer
//!     permissions: [users.view]
//! principals:
//!   - { username: alice, role: viewer }
//! ```
//!
//! A seed is applied through the managers, so it is held to the same
//! rules as any admin edit.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::{ConfigError, RecordStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPermission {
    /// Module code
    pub module: String,
    /// Action code
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRole {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub status: RecordStatus,
    /// Permission keys (`module.action`)
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPrincipal {
    pub username: String,
    /// Role name
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

/// Catalog, roles and principals to load into an empty store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub modules: Vec<SeedEntry>,
    #[serde(default)]
    pub actions: Vec<SeedEntry>,
    #[serde(default)]
    pub permissions: Vec<SeedPermission>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub principals: Vec<SeedPrincipal>,
}

/// What a seed created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub modules: usize,
    pub actions: usize,
    pub permissions: usize,
    pub roles: usize,
    pub principals: usize,
}

fn entry(code: &str, title: &str) -> SeedEntry {
    SeedEntry {
        code: code.to_string(),
        title: title.to_string(),
    }
}

impl CatalogSeed {
    /// Load a seed from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        shared::load_document(path)
    }

    /// A small back-office catalog: every module/action pair, an `admin`
    /// role holding all of them and a read-only `viewer`
    pub fn example() -> Self {
        let modules = vec![
            entry("users", "Users"),
            entry("roles", "Roles"),
            entry("zones", "Zones"),
            entry("categories", "Categories"),
        ];
        let actions = vec![
            entry("view", "View"),
            entry("create", "Create"),
            entry("edit", "Edit"),
            entry("delete", "Delete"),
        ];

        let mut permissions = Vec::new();
        for module in &modules {
            for action in &actions {
                permissions.push(SeedPermission {
                    module: module.code.clone(),
                    action: action.code.clone(),
                    label: String::new(),
                });
            }
        }

        let all_keys: Vec<String> = permissions
            .iter()
            .map(|p| shared::Permission::key_for(&p.module, &p.action))
            .collect();
        let view_keys: Vec<String> = modules
            .iter()
            .map(|m| shared::Permission::key_for(&m.code, "view"))
            .collect();

        Self {
            modules,
            actions,
            permissions,
            roles: vec![
                SeedRole {
                    name: "admin".to_string(),
                    description: "Full back-office access".to_string(),
                    status: RecordStatus::Active,
                    permissions: all_keys,
                },
                SeedRole {
                    name: "viewer".to_string(),
                    description: "Read-only access".to_string(),
                    status: RecordStatus::Active,
                    permissions: view_keys,
                },
            ],
            principals: vec![
                SeedPrincipal {
                    username: "admin".to_string(),
                    role: Some("admin".to_string()),
                    status: RecordStatus::Active,
                },
                SeedPrincipal {
                    username: "guest".to_string(),
                    role: None,
                    status: RecordStatus::Active,
                },
            ],
        }
    }
}
