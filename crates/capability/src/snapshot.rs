//! Snapshot normalization
//!
//! Cached snapshots come in three encodings, possibly mixed:
//!
//! ```text
//! "users.view"                                         flat key
//! { "permission_key": "users.view", ... }              permission record
//! { "module_code": "users", "actions": [ ... ] }       access tree node
//! ```
//!
//! All of them are reduced once, at load time, to a set of
//! `module.action` keys.

use std::collections::BTreeSet;

use serde::Deserialize;
use shared::{Permission, KEY_SEPARATOR};
use thiserror::Error;

/// Errors raised while loading a capability snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot entry {index} has an unrecognized shape")]
    UnrecognizedEntry { index: usize },

    #[error("Malformed permission key '{0}' (expected 'module.action')")]
    MalformedKey(String),

    #[error("Malformed code '{0}'")]
    MalformedCode(String),
}

/// One entry of a cached snapshot, in any accepted encoding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Key(String),
    Record { permission_key: String },
    Module {
        module_code: String,
        #[serde(default)]
        actions: Vec<ActionEntry>,
    },
}

/// An action inside an access tree node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActionEntry {
    Code(String),
    Record { action_code: String },
}

impl ActionEntry {
    fn code(&self) -> &str {
        match self {
            ActionEntry::Code(code) | ActionEntry::Record { action_code: code } => code,
        }
    }
}

fn checked_key(key: &str) -> Result<String, SnapshotError> {
    match Permission::split_key(key) {
        Some((module, action)) => Ok(Permission::key_for(module, action)),
        None => Err(SnapshotError::MalformedKey(key.to_string())),
    }
}

fn checked_code(code: &str) -> Result<&str, SnapshotError> {
    if code.is_empty() || code.contains(KEY_SEPARATOR) {
        return Err(SnapshotError::MalformedCode(code.to_string()));
    }
    Ok(code)
}

impl SnapshotEntry {
    /// Append the keys this entry grants to `out`
    pub fn collect_keys(&self, out: &mut BTreeSet<String>) -> Result<(), SnapshotError> {
        match self {
            SnapshotEntry::Key(key) | SnapshotEntry::Record { permission_key: key } => {
                out.insert(checked_key(key)?);
            }
            SnapshotEntry::Module {
                module_code,
                actions,
            } => {
                let module = checked_code(module_code)?;
                for action in actions {
                    out.insert(Permission::key_for(module, checked_code(action.code())?));
                }
            }
        }
        Ok(())
    }
}

/// Normalize raw snapshot entries into the canonical key set
pub fn normalize_entries(entries: &[serde_json::Value]) -> Result<BTreeSet<String>, SnapshotError> {
    let mut keys = BTreeSet::new();
    for (index, raw) in entries.iter().enumerate() {
        let entry = SnapshotEntry::deserialize(raw)
            .map_err(|_| SnapshotError::UnrecognizedEntry { index })?;
        entry.collect_keys(&mut keys)?;
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: serde_json::Value) -> Result<Vec<String>, SnapshotError> {
        let entries = value.as_array().cloned().unwrap_or_default();
        Ok(normalize_entries(&entries)?.into_iter().collect())
    }

    #[test]
    fn test_flat_keys() {
        assert_eq!(
            keys(json!(["users.view", "users.edit"])).unwrap(),
            vec!["users.edit", "users.view"]
        );
    }

    #[test]
    fn test_permission_records() {
        let value = json!([
            { "id": 1, "permission_key": "users.view", "label": "Users - View" },
            { "id": 2, "permission_key": "zones.edit" }
        ]);
        assert_eq!(keys(value).unwrap(), vec!["users.view", "zones.edit"]);
    }

    #[test]
    fn test_access_tree() {
        let value = json!([
            {
                "module_code": "users",
                "module_title": "Users",
                "actions": [
                    { "action_code": "view", "action_title": "View" },
                    { "action_code": "edit", "action_title": "Edit" }
                ]
            },
            { "module_code": "zones", "module_title": "Zones", "actions": [] }
        ]);
        assert_eq!(keys(value).unwrap(), vec!["users.edit", "users.view"]);
    }

    #[test]
    fn test_encodings_yield_same_set() {
        let flat = keys(json!(["users.view", "users.edit"])).unwrap();
        let records = keys(json!([
            { "permission_key": "users.edit" },
            { "permission_key": "users.view" }
        ]))
        .unwrap();
        let tree = keys(json!([
            { "module_code": "users", "actions": [{ "action_code": "view" }, "edit"] }
        ]))
        .unwrap();

        assert_eq!(flat, records);
        assert_eq!(flat, tree);
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_mixed_entries() {
            let value = json!([
                "users.view",
                { "permission_key": "users.edit" },
                { "module_code": "zones", "actions": [{ "action_code": "view" }] }
            ]);
            assert_eq!(
                keys(value).unwrap(),
                vec!["users.edit", "users.view", "zones.view"]
            );
        }

        #[test]
        fn test_malformed_key_rejected() {
            for bad in ["users", "users.view.extra", ".view", "users."] {
                let err = keys(json!([bad])).unwrap_err();
                assert!(matches!(err, SnapshotError::MalformedKey(_)), "{}", bad);
            }
        }

        #[test]
        fn test_dotted_code_in_tree_rejected() {
            let err = keys(json!([
                { "module_code": "users.admin", "actions": [{ "action_code": "view" }] }
            ]))
            .unwrap_err();
            assert!(matches!(err, SnapshotError::MalformedCode(_)));
        }

        #[test]
        fn test_unrecognized_shape_reports_index() {
            let err = keys(json!(["users.view", { "label": "Users - View" }])).unwrap_err();
            assert!(matches!(err, SnapshotError::UnrecognizedEntry { index: 1 }));

            let err = keys(json!(["users.view", 42])).unwrap_err();
            assert!(matches!(err, SnapshotError::UnrecognizedEntry { index: 1 }));
        }

        #[test]
        fn test_duplicates_collapse() {
            let value = json!(["users.view", { "permission_key": "users.view" }]);
            assert_eq!(keys(value).unwrap(), vec!["users.view"]);
        }
    }
}
