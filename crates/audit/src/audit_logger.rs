//! AuditLogger - Bounded audit trail

use serde::{Deserialize, Serialize};
use shared::{AuditSettings, ErrorKind, PermissionId, PrincipalId, RoleId};
use std::collections::VecDeque;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    pub event_type: AuditEventType,
    pub principal_id: Option<PrincipalId>,
    pub role_id: Option<RoleId>,
    /// `module.action` for decisions
    pub permission_key: Option<String>,
    pub success: bool,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Types of audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Login,
    AuthorizationGranted,
    AuthorizationDenied,
    PermissionsReplaced,
    CatalogChanged,
}

/// Audit logger
#[derive(Debug)]
pub struct AuditLogger {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
    record_granted: bool,
}

impl AuditLogger {
    /// Create a new AuditLogger keeping at most `max_entries`
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries: max_entries.max(1),
            record_granted: false,
        }
    }

    pub fn from_settings(settings: &AuditSettings) -> Self {
        Self::new(settings.max_entries).with_record_granted(settings.record_granted)
    }

    /// Builder: also record allowed decisions
    pub fn with_record_granted(mut self, record_granted: bool) -> Self {
        self.record_granted = record_granted;
        self
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: AuditEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn entry(event_type: AuditEventType, success: bool) -> AuditEntry {
        AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            principal_id: None,
            role_id: None,
            permission_key: None,
            success,
            reason: None,
            metadata: None,
        }
    }

    /// Log a login attempt
    pub fn log_login(
        &mut self,
        principal_id: PrincipalId,
        role_id: Option<RoleId>,
        granted: usize,
        failure: Option<&str>,
    ) {
        self.log(AuditEntry {
            principal_id: Some(principal_id),
            role_id,
            reason: failure.map(str::to_string),
            metadata: Some(serde_json::json!({ "granted": granted })),
            ..Self::entry(AuditEventType::Login, failure.is_none())
        });
    }

    /// Log a gate decision. Allowed decisions are only kept when
    /// `record_granted` is set.
    pub fn log_decision(
        &mut self,
        principal_id: Option<PrincipalId>,
        permission_key: &str,
        denial: Option<(ErrorKind, &str)>,
    ) {
        let event_type = match denial {
            None if !self.record_granted => return,
            None => AuditEventType::AuthorizationGranted,
            Some(_) => AuditEventType::AuthorizationDenied,
        };
        self.log(AuditEntry {
            principal_id,
            permission_key: Some(permission_key.to_string()),
            reason: denial.map(|(_, message)| message.to_string()),
            metadata: denial.map(|(kind, _)| serde_json::json!({ "kind": kind })),
            ..Self::entry(event_type, denial.is_none())
        });
    }

    /// Log a replace of a role's permission set
    pub fn log_permissions_replaced(
        &mut self,
        role_id: RoleId,
        outcome: Result<&[PermissionId], &str>,
    ) {
        let mut entry = Self::entry(AuditEventType::PermissionsReplaced, outcome.is_ok());
        entry.role_id = Some(role_id);
        match outcome {
            Ok(final_set) => {
                entry.metadata = Some(serde_json::json!({ "permissionIds": final_set }));
            }
            Err(reason) => entry.reason = Some(reason.to_string()),
        }
        self.log(entry);
    }

    /// Log a catalog mutation such as `create module 'users'`
    pub fn log_catalog_change(&mut self, description: &str) {
        self.log(AuditEntry {
            reason: Some(description.to_string()),
            ..Self::entry(AuditEventType::CatalogChanged, true)
        });
    }

    /// Get recent entries, newest first
    pub fn get_recent(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Get recent denials, newest first
    pub fn get_recent_denials(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.success)
            .take(limit)
            .collect()
    }

    /// Get statistics
    pub fn get_stats(&self) -> AuditStats {
        let count = |t: AuditEventType| self.entries.iter().filter(|e| e.event_type == t).count();

        AuditStats {
            total_entries: self.entries.len(),
            denial_count: self.entries.iter().filter(|e| !e.success).count(),
            login_count: count(AuditEventType::Login),
            replace_count: count(AuditEventType::PermissionsReplaced),
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.entries).unwrap_or_default()
    }
}

/// Audit statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStats {
    pub total_entries: usize,
    pub denial_count: usize,
    pub login_count: usize,
    pub replace_count: usize,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::from_settings(&AuditSettings::default())
    }
}
