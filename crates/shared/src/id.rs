//! Store-allocated identifiers

use serde::{Deserialize, Serialize};

/// Declares a `u64` newtype identifier.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a functional area
    ModuleId
);
define_id!(
    /// Identifier of an operation kind
    ActionId
);
define_id!(
    /// Identifier of a grantable capability
    PermissionId
);
define_id!(
    /// Identifier of a role
    RoleId
);
define_id!(
    /// Identifier of a role → permission join row
    AssignmentId
);
define_id!(
    /// Identifier of an authenticated actor
    PrincipalId
);
