//! Serializable image of a store, used to persist state between runs

use serde::{Deserialize, Serialize};
use shared::{Action, Module, Permission, Principal, Role, RoleAssignment};

use super::{StoreError, StoreResult};

/// Last id issued per table. Ids are never reused, even after deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequences {
    #[serde(default)]
    pub module: u64,
    #[serde(default)]
    pub action: u64,
    #[serde(default)]
    pub permission: u64,
    #[serde(default)]
    pub role: u64,
    #[serde(default)]
    pub assignment: u64,
    #[serde(default)]
    pub principal: u64,
}

impl Sequences {
    /// The id following `counter`. Does not advance it; inserting the row
    /// does, through `observe`.
    pub(crate) fn next(counter: u64, table: &'static str) -> StoreResult<u64> {
        counter
            .checked_add(1)
            .ok_or(StoreError::SequenceExhausted { table })
    }

    pub(crate) fn observe(counter: &mut u64, id: u64) {
        if id > *counter {
            *counter = id;
        }
    }
}

/// Every row of every table, ascending by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub principals: Vec<Principal>,
    #[serde(default)]
    pub assignments: Vec<RoleAssignment>,
    #[serde(default)]
    pub sequences: Sequences,
}

impl StoreSnapshot {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.actions.is_empty()
            && self.permissions.is_empty()
            && self.roles.is_empty()
            && self.principals.is_empty()
            && self.assignments.is_empty()
    }
}
