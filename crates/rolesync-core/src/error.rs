//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported manifest format: {path} (expected .yml, .yaml or .json)")]
    UnsupportedFormat { path: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("Invalid role: {message}")]
    InvalidRole { message: String },

    #[error("Invalid deploy group role: {message}")]
    InvalidDeployGroupRole { message: String },
}

impl CoreError {
    pub(crate) fn parse(path: &str, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_manifest(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error means the text itself could not be read as a manifest
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnsupportedFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
