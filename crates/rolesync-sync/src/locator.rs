//! Manifest discovery
//!
//! Finds candidate manifest files in a repository by convention: anything
//! with a manifest extension below one of the manifest directories, plus
//! root-level files matching a backward compatible name pattern.

use regex::Regex;

use crate::config::{DEFAULT_MANIFEST_DIRECTORY, DEFAULT_ROOT_FILE_PATTERN, SyncConfig};
use crate::error::Result;
use crate::repository::Repository;
use rolesync_core::ManifestFormat;

/// Locates manifest files by path convention
#[derive(Debug, Clone)]
pub struct ManifestLocator {
    directories: Vec<String>,
    root_patterns: Vec<Regex>,
}

impl Default for ManifestLocator {
    fn default() -> Self {
        Self {
            directories: vec![DEFAULT_MANIFEST_DIRECTORY.to_string()],
            root_patterns: vec![Regex::new(DEFAULT_ROOT_FILE_PATTERN).expect("valid regex")],
        }
    }
}

impl ManifestLocator {
    /// Create a locator for the given directories and root file patterns
    pub fn new(directories: Vec<String>, root_patterns: Vec<Regex>) -> Self {
        let directories = directories
            .into_iter()
            .map(|d| d.trim_matches('/').to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            directories,
            root_patterns,
        }
    }

    /// Build a locator from configuration, compiling its patterns
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let root_patterns = config
            .root_file_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(config.manifest_directories.clone(), root_patterns))
    }

    /// Whether a repository path is a candidate manifest
    pub fn matches(&self, path: &str) -> bool {
        if !ManifestFormat::is_supported(path) {
            return false;
        }

        let in_directory = self.directories.iter().any(|dir| {
            path.strip_prefix(dir.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty())
        });
        if in_directory {
            return true;
        }

        !path.contains('/') && self.root_patterns.iter().any(|re| re.is_match(path))
    }

    /// Candidate manifest paths at `git_ref`, sorted
    pub fn locate(&self, repo: &dyn Repository, git_ref: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = repo
            .list_files(git_ref)?
            .into_iter()
            .filter(|path| self.matches(path))
            .collect();
        paths.sort();
        paths.dedup();

        for path in &paths {
            tracing::debug!("Found manifest candidate {}", path);
        }
        Ok(paths)
    }

    /// Human readable summary of where manifests are looked for
    pub fn describe(&self) -> String {
        let mut places: Vec<String> = self.directories.iter().map(|d| format!("{}/", d)).collect();
        places.extend(self.root_patterns.iter().map(|re| format!("/{}/", re.as_str())));
        places.join(", ")
    }
}
