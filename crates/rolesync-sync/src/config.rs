//! Synchronization configuration
//!
//! Stored in `~/.config/rolesync/config.yaml`; every field has a default so
//! a missing file means "use the conventions".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Directory manifests are expected in
pub const DEFAULT_MANIFEST_DIRECTORY: &str = "kubernetes";

/// Root-level file names still picked up for older repositories
pub const DEFAULT_ROOT_FILE_PATTERN: &str = r"^kubernetes-[^/]+\.(ya?ml|json)$";

/// How often a seed recomputes names after losing a uniqueness race
pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;

/// Synchronization configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Directories scanned for manifests
    #[serde(default = "default_manifest_directories")]
    pub manifest_directories: Vec<String>,

    /// Regular expressions for manifests at the repository root
    #[serde(default = "default_root_file_patterns")]
    pub root_file_patterns: Vec<String>,

    /// Attempts before a uniqueness conflict is reported
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: usize,

    /// Registry database path
    #[serde(default)]
    pub database: Option<PathBuf>,
}

fn default_api_version() -> String {
    "rolesync.io/v1".to_string()
}

fn default_manifest_directories() -> Vec<String> {
    vec![DEFAULT_MANIFEST_DIRECTORY.to_string()]
}

fn default_root_file_patterns() -> Vec<String> {
    vec![DEFAULT_ROOT_FILE_PATTERN.to_string()]
}

fn default_max_conflict_retries() -> usize {
    DEFAULT_MAX_CONFLICT_RETRIES
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            manifest_directories: default_manifest_directories(),
            root_file_patterns: default_root_file_patterns(),
            max_conflict_retries: default_max_conflict_retries(),
            database: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| SyncError::Config {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("rolesync").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.max_conflict_retries == 0 {
            return Err(SyncError::Config {
                message: "maxConflictRetries must be at least 1".to_string(),
            });
        }
        if let Some(dir) = self
            .manifest_directories
            .iter()
            .find(|d| d.trim_matches('/').is_empty())
        {
            return Err(SyncError::Config {
                message: format!("manifest directory '{}' is empty", dir),
            });
        }
        Ok(())
    }
}
