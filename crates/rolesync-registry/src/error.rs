//! Error types for role registry operations

use rolesync_core::{CoreError, RoleId};
use thiserror::Error;

/// Columns whose values must be unique among active records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    ResourceName,
    ServiceName,
    /// One override per role and deploy group
    DeployGroup,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ResourceName => "resource_name",
            Self::ServiceName => "service_name",
            Self::DeployGroup => "deploy_group",
        };
        f.write_str(name)
    }
}

/// Registry operation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{field} '{value}' is already taken")]
    Conflict { field: UniqueField, value: String },

    #[error("Role not found: {id}")]
    RoleNotFound { id: RoleId },

    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Whether retrying with different names could succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<rusqlite::Error> for RegistryError {
    fn from(e: rusqlite::Error) -> Self {
        RegistryError::Storage {
            message: e.to_string(),
        }
    }
}
