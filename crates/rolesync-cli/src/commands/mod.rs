//! CLI commands

pub mod configured;
pub mod defaults;
pub mod roles;
pub mod seed;

use std::path::PathBuf;

use rolesync_registry::SqliteRoleStore;
use rolesync_sync::SyncConfig;

use crate::error::Result;

/// Global options shared by the commands that touch the registry
pub struct Context {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, db_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            db_path,
        }
    }

    /// Explicit config file, otherwise the default location
    pub fn config(&self) -> Result<SyncConfig> {
        let config = match &self.config_path {
            Some(path) => SyncConfig::load_from(path)?,
            None => SyncConfig::load()?,
        };
        tracing::debug!(
            "Manifest directories: {}",
            config.manifest_directories.join(", ")
        );
        Ok(config)
    }

    /// Open the registry: `--db`, then the config's `database`, then the default path
    pub fn open_store(&self, config: &SyncConfig) -> Result<SqliteRoleStore> {
        let path = match self.db_path.as_ref().or(config.database.as_ref()) {
            Some(path) => path.clone(),
            None => SqliteRoleStore::default_path()?,
        };
        tracing::debug!("Using role registry {}", path.display());
        Ok(SqliteRoleStore::open_at(&path)?)
    }
}
