//! Error types for confmon-rules

use std::path::PathBuf;
use uuid::Uuid;

/// Result type for confmon-rules operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or publishing rule files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every enabled rule of the group failed conversion
    #[error("No convertible rules for group {group_id}: all {attempted} rules failed conversion")]
    NoConvertibleRules { group_id: Uuid, attempted: usize },

    /// Rule file could not be written, renamed, or removed
    #[error("Failed to write rule file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: confmon_fs::Error,
    },

    /// Rule file could not be serialized or did not survive a re-parse
    #[error("Failed to serialize rule file for group {group_id}: {message}")]
    Serialize { group_id: Uuid, message: String },

    /// A single alert rule cannot be expressed as a Prometheus rule
    #[error("Invalid alert rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Error from confmon-core (lookups, validation, rendering)
    #[error(transparent)]
    Core(#[from] confmon_core::Error),

    /// Filesystem error from confmon-fs
    #[error(transparent)]
    Fs(#[from] confmon_fs::Error),

    /// I/O error while scanning rule or backup directories
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML error while reading a rule file
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn invalid_rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}
