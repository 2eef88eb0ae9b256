//! Configured role resolution
//!
//! Answers "which of this project's roles can be deployed from this ref".
//! A role qualifies when its `config_file` is tracked at the ref and parses
//! into a valid role manifest. The path is matched exactly, so roles whose
//! file lives outside the conventional directories are still found.

use std::collections::HashSet;

use rolesync_core::{Defaults, Project, Role, RoleManifest, extract_defaults, parse_documents};
use rolesync_registry::RoleStore;

use crate::error::Result;
use crate::repository::Repository;

/// Resolves the roles that are configured at a given ref
pub struct ConfiguredRoleResolver<'a> {
    repo: &'a dyn Repository,
}

impl<'a> ConfiguredRoleResolver<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Active roles of `project` whose manifest is present and valid at `git_ref`
    ///
    /// Roles whose file is missing at the ref are left out. A present file
    /// that is not a valid manifest fails the whole call.
    pub fn configured_for_project(
        &self,
        store: &dyn RoleStore,
        project: &Project,
        git_ref: &str,
    ) -> Result<Vec<Role>> {
        let tracked: HashSet<String> = self.repo.list_files(git_ref)?.into_iter().collect();
        let mut configured = Vec::new();

        for role in store.active_roles_for_project(project.id)? {
            if role.is_deleted() || !tracked.contains(&role.config_file) {
                tracing::debug!("{} is not part of {}", role.config_file, git_ref);
                continue;
            }

            let Some(content) = self.repo.file_content(&role.config_file, git_ref)? else {
                tracing::debug!("{} has no content at {}", role.config_file, git_ref);
                continue;
            };

            RoleManifest::parse(&role.config_file, &content)?;
            configured.push(role);
        }

        Ok(configured)
    }
}

/// Resource defaults declared by a role's manifest at `git_ref`
///
/// `None` when the file is missing, cannot be read as a manifest, or has no
/// workload document.
pub fn role_defaults(
    repo: &dyn Repository,
    role: &Role,
    git_ref: &str,
) -> Result<Option<Defaults>> {
    let Some(content) = repo.file_content(&role.config_file, git_ref)? else {
        return Ok(None);
    };

    let documents = match parse_documents(&role.config_file, &content) {
        Ok(documents) => documents,
        Err(e) if e.is_parse_failure() => {
            tracing::debug!("{} does not qualify for defaults: {}", role.config_file, e);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    Ok(extract_defaults(&role.config_file, &documents)?)
}
