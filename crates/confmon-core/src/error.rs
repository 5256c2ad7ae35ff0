//! Error types for confmon-core

use uuid::Uuid;

use crate::render::RenderError;

/// Result type for confmon-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in confmon-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Scope and scope identifiers do not match
    #[error("Invalid scope for {field}: {message}")]
    ScopeConsistency { field: String, message: String },

    /// Field-level validation failure
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Requested entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Reference to a parent entity that does not exist
    #[error("Referenced {entity} does not exist: {id}")]
    ForeignKeyViolation { entity: &'static str, id: String },

    /// Group parent chain loops back on itself
    #[error("Circular group hierarchy detected at group {group_id}")]
    CircularReference { group_id: Uuid },

    /// Query template could not be rendered
    #[error(transparent)]
    Render(#[from] RenderError),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from confmon-fs
    #[error(transparent)]
    Fs(#[from] confmon_fs::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn scope(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScopeConsistency {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn foreign_key(entity: &'static str, id: impl ToString) -> Self {
        Self::ForeignKeyViolation {
            entity,
            id: id.to_string(),
        }
    }

    /// True for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
