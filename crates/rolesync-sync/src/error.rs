//! Error types for manifest discovery and role synchronization

use miette::Diagnostic;
use rolesync_core::CoreError;
use rolesync_registry::{RegistryError, UniqueField};
use thiserror::Error;

/// Synchronization errors
///
/// Variants marked user-facing carry a message meant for whoever triggered
/// the seed or deploy, not an internal trace.
#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    #[error("No configs found in kubernetes folder or invalid git ref {git_ref}")]
    #[diagnostic(
        code(rolesync::sync::no_configs),
        help("Manifests are looked up in: {searched}")
    )]
    NoConfigsFound { git_ref: String, searched: String },

    #[error("Invalid manifest {path}: {message}")]
    #[diagnostic(code(rolesync::sync::invalid_manifest))]
    InvalidManifest { path: String, message: String },

    #[error("Invalid role: {message}")]
    #[diagnostic(code(rolesync::sync::invalid_role))]
    InvalidRole { message: String },

    #[error("Could not reserve {field} '{value}' after {attempts} attempt(s)")]
    #[diagnostic(
        code(rolesync::sync::name_conflict),
        help("Another seed is creating roles with the same names, try again")
    )]
    NameConflict {
        field: UniqueField,
        value: String,
        attempts: usize,
    },

    #[error("Repository error: {message}")]
    #[diagnostic(code(rolesync::sync::repository))]
    Repository { message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(rolesync::sync::config))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(code(rolesync::sync::registry))]
    Registry(RegistryError),

    #[error("IO error: {0}")]
    #[diagnostic(code(rolesync::sync::io))]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether the message should be shown to the user as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NoConfigsFound { .. }
                | Self::InvalidManifest { .. }
                | Self::InvalidRole { .. }
                | Self::NameConflict { .. }
        )
    }

    pub(crate) fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<CoreError> for SyncError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidManifest { path, message } | CoreError::Parse { path, message } => {
                SyncError::InvalidManifest { path, message }
            }
            CoreError::UnsupportedFormat { path } => SyncError::InvalidManifest {
                path,
                message: "unsupported format, expected .yml, .yaml or .json".to_string(),
            },
            CoreError::InvalidRole { message } | CoreError::InvalidDeployGroupRole { message } => {
                SyncError::InvalidRole { message }
            }
        }
    }
}

impl From<RegistryError> for SyncError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation(core) => core.into(),
            other => SyncError::Registry(other),
        }
    }
}

impl From<serde_yaml::Error> for SyncError {
    fn from(e: serde_yaml::Error) -> Self {
        SyncError::Config {
            message: e.to_string(),
        }
    }
}

impl From<regex::Error> for SyncError {
    fn from(e: regex::Error) -> Self {
        SyncError::Config {
            message: format!("invalid file pattern: {}", e),
        }
    }
}
