//! Role and principal records

use crate::id::{AssignmentId, PermissionId, PrincipalId, RoleId};
use serde::{Deserialize, Serialize};

/// Whether a role or account is usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }
}

impl core::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordStatus::Active => write!(f, "active"),
            RecordStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A named bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Unique role name (e.g. "editor")
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: RecordStatus,
}

impl Role {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Input for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewRole {
    /// Create an active role with no description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: RecordStatus::Active,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set status
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial role update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<RecordStatus>,
}

/// Join row granting one permission to one role.
///
/// Unique on `(role_id, permission_id)`. Rows are never edited; a role's
/// rows are replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: AssignmentId,
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

/// The authenticated actor. Holds at most one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl Principal {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Input for creating a principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrincipal {
    pub username: String,
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewPrincipal {
    pub fn new(username: impl Into<String>, role_id: Option<RoleId>) -> Self {
        Self {
            username: username.into(),
            role_id,
            status: RecordStatus::Active,
        }
    }

    /// Builder: set status
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial principal update. `role_id: Some(None)` clears the role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrincipalUpdate {
    pub role_id: Option<Option<RoleId>>,
    pub status: Option<RecordStatus>,
}
