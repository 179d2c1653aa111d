//! Error taxonomy for Gatehouse
//!
//! Every failure surfaced by the engine resolves to one [`ErrorKind`].
//! Transport layers map the kind to a status code via
//! [`AccessError::status_code`] and render an [`ErrorBody`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error thrown when a referenced record does not exist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} '{key}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub key: String,
}

impl NotFoundError {
    pub fn new(entity: &'static str, key: impl ToString) -> Self {
        Self {
            entity,
            key: key.to_string(),
        }
    }
}

/// Error thrown when a replace request names permissions that do not exist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown permission ids for role '{role_id}': {}", format_ids(unknown_ids))]
pub struct UnknownPermissionsError {
    pub role_id: u64,
    /// Sorted and deduplicated
    pub unknown_ids: Vec<u64>,
}

fn format_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Kind of an [`AccessError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    Validation,
    Conflict,
    NotFound,
    Internal,
}

/// General Gatehouse error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    UnknownPermissions(#[from] UnknownPermissionsError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AccessError::Forbidden(_) => ErrorKind::Forbidden,
            AccessError::UnknownPermissions(_) | AccessError::Validation(_) => {
                ErrorKind::Validation
            }
            AccessError::Conflict(_) => ErrorKind::Conflict,
            AccessError::NotFound(_) => ErrorKind::NotFound,
            AccessError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Validation => 422,
            ErrorKind::Internal => 500,
        }
    }

    /// Structured body for user-visible responses
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        NotFoundError::new(entity, key).into()
    }
}

/// Wire shape of a denied or failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AccessError::Unauthenticated("x".into()).status_code(), 401);
        assert_eq!(AccessError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(AccessError::not_found("Role", 5).status_code(), 404);
        assert_eq!(AccessError::Conflict("x".into()).status_code(), 409);
        assert_eq!(AccessError::Validation("x".into()).status_code(), 422);
        assert_eq!(AccessError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_unknown_permissions_is_validation() {
        let err: AccessError = UnknownPermissionsError {
            role_id: 5,
            unknown_ids: vec![999, 1000],
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "Unknown permission ids for role '5': 999, 1000"
        );
    }

    #[test]
    fn test_error_body_serialization() {
        let body = AccessError::Forbidden("missing users.delete".into()).to_body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["kind"], "forbidden");
        assert_eq!(json["message"], "Forbidden: missing users.delete");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            AccessError::not_found("Role", 5).to_string(),
            "Role '5' not found"
        );
    }
}
