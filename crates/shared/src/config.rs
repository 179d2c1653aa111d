//! Configuration types for Gatehouse

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration or seed documents
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format for {0:?} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

/// Audit trail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSettings {
    /// Ring buffer capacity
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Record granted authorizations, not only denials
    #[serde(default)]
    pub record_granted: bool,
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            record_granted: false,
        }
    }
}

/// Engine configuration (gatehouse.yaml / gatehouse.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub audit: AuditSettings,

    /// Catalog seed applied when the engine starts from an empty store
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }
}

/// Read a serde document, choosing the format from the file extension
pub fn load_document<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
