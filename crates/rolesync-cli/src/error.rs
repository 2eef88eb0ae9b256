//! CLI error types with exit code handling
//!
//! Library errors are folded into one type here so every failure leaves the
//! process with a meaningful exit code.

use miette::Diagnostic;
use rolesync_core::CoreError;
use rolesync_registry::RegistryError;
use rolesync_sync::SyncError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid role, override or configuration
    #[error("Validation failed: {message}")]
    #[diagnostic(code(rolesync::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifests missing or invalid
    #[error("{message}")]
    #[diagnostic(code(rolesync::cli::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A unique name is already taken
    #[error("Conflict: {message}")]
    #[diagnostic(code(rolesync::cli::conflict))]
    Conflict {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(rolesync::cli::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(rolesync::cli::error))]
    Other { message: String },

    /// Internal error (storage, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(rolesync::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::Conflict { .. } => exit_codes::CONFLICT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a manifest error
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
            help: None,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedFormat { .. }
            | CoreError::Parse { .. }
            | CoreError::InvalidManifest { .. } => CliError::manifest(err.to_string()),
            CoreError::InvalidRole { .. } | CoreError::InvalidDeployGroupRole { .. } => {
                CliError::validation(err.to_string())
            }
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Conflict { .. } => CliError::Conflict {
                message: err.to_string(),
                help: None,
            },
            RegistryError::RoleNotFound { .. } => CliError::Other {
                message: err.to_string(),
            },
            RegistryError::Validation(core) => core.into(),
            RegistryError::Io(e) => e.into(),
            RegistryError::Storage { message } => CliError::internal(message),
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NoConfigsFound { ref searched, .. } => CliError::Manifest {
                help: Some(format!("Manifests are looked up in: {}", searched)),
                message: err.to_string(),
            },
            SyncError::InvalidManifest { .. } => CliError::manifest(err.to_string()),
            SyncError::InvalidRole { .. } | SyncError::Config { .. } => {
                CliError::validation(err.to_string())
            }
            SyncError::NameConflict { .. } => CliError::Conflict {
                message: err.to_string(),
                help: Some("Another seed is creating roles with the same names, try again".into()),
            },
            SyncError::Registry(e) => e.into(),
            SyncError::Io(e) => e.into(),
            SyncError::Repository { .. } => CliError::Other {
                message: err.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("failed to render JSON: {}", err))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
