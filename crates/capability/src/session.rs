//! Session - the capability snapshot held by a client
//!
//! Built at login and passed by reference to whatever renders the UI.
//! Evaluation is a set lookup; the snapshot is never re-inspected.

use std::collections::BTreeSet;

use serde::Deserialize;
use shared::{LoginResponse, Permission, Principal};
use tracing::debug;

use crate::snapshot::{normalize_entries, SnapshotError};

/// Wire shape of a login response whose `access` may use any encoding
#[derive(Debug, Deserialize)]
struct RawLogin {
    #[serde(default)]
    principal: Option<Principal>,
    #[serde(default)]
    access: Vec<serde_json::Value>,
}

/// A logged-in (or anonymous) client's capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    principal: Option<Principal>,
    permissions: BTreeSet<String>,
}

impl Session {
    /// A session with no principal and no permissions
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build a session from a typed login response
    pub fn from_login(response: &LoginResponse) -> Self {
        Self {
            principal: Some(response.principal.clone()),
            permissions: shared::access_tree_keys(&response.access)
                .into_iter()
                .collect(),
        }
    }

    /// Build a session from a cached login payload
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build a session from a cached login payload already parsed as JSON.
    ///
    /// A bare array is accepted as an access list without a principal.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let raw = match value {
            serde_json::Value::Array(access) => RawLogin {
                principal: None,
                access,
            },
            other => RawLogin::deserialize(other)?,
        };
        let permissions = normalize_entries(&raw.access)?;
        debug!(permissions = permissions.len(), "capability snapshot loaded");
        Ok(Self {
            principal: raw.principal,
            permissions,
        })
    }

    /// Replace the snapshot with a fresh login response
    pub fn login(&mut self, response: &LoginResponse) {
        *self = Self::from_login(response);
    }

    /// Drop the principal and every permission
    pub fn logout(&mut self) {
        *self = Self::anonymous();
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Whether the snapshot holds `module.action`
    pub fn can(&self, module: &str, action: &str) -> bool {
        self.permissions.contains(&Permission::key_for(module, action))
    }

    /// Whether the snapshot holds a permission by key
    pub fn can_key(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }

    /// Whether any of the `(module, action)` pairs is held
    pub fn can_any(&self, required: &[(&str, &str)]) -> bool {
        required.iter().any(|(module, action)| self.can(module, action))
    }

    /// Module codes with at least one permitted action, sorted
    pub fn visible_modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = self
            .permissions
            .iter()
            .filter_map(|key| Permission::split_key(key).map(|(module, _)| module))
            .collect();
        modules.dedup();
        modules
    }

    /// Canonical permission keys
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }
}
