//! Role seeding
//!
//! Discovers manifests at a ref and creates one role per manifest that the
//! project does not have yet. Seeding is all-or-nothing: any invalid manifest
//! aborts the whole pass before anything is written.
//!
//! ## Naming
//!
//! - `name`: the workload's `metadata.name`, slugged
//! - `resource_name`: the slugged name, or `<project>-<name>` when that is
//!   taken by any active role, then `<project>-<name>-2`, `-3`, ...
//! - `service_name`: the Service's name, or `<name>-change-me-<n>` when it
//!   is taken by any active role
//!
//! Names are picked against current storage state and the store rejects
//! duplicates on write. A rejected batch is re-planned against fresh state a
//! bounded number of times.

use std::collections::{HashMap, HashSet};

use rolesync_core::{NewRole, Project, Role, RoleManifest, slugify};
use rolesync_registry::{RegistryError, RoleStore};

use crate::config::{DEFAULT_MAX_CONFLICT_RETRIES, SyncConfig};
use crate::error::{Result, SyncError};
use crate::locator::ManifestLocator;
use crate::repository::Repository;

/// Marker inserted into generated service names so operators notice them
pub const GENERATED_SERVICE_MARKER: &str = "-change-me-";

/// Creates roles from the manifests found in a repository
pub struct RoleSynchronizer<'a> {
    repo: &'a dyn Repository,
    locator: ManifestLocator,
    max_attempts: usize,
}

impl<'a> RoleSynchronizer<'a> {
    /// Synchronizer with the conventional manifest locations
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self {
            repo,
            locator: ManifestLocator::default(),
            max_attempts: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// Synchronizer configured from a [`SyncConfig`]
    pub fn from_config(repo: &'a dyn Repository, config: &SyncConfig) -> Result<Self> {
        Ok(Self::new(repo)
            .with_locator(ManifestLocator::from_config(config)?)
            .with_max_attempts(config.max_conflict_retries))
    }

    pub fn with_locator(mut self, locator: ManifestLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Seed roles for `project` from the manifests at `git_ref`
    ///
    /// Returns the roles created by this call; manifests that already have
    /// an active role are left alone.
    pub fn seed(
        &self,
        store: &mut dyn RoleStore,
        project: &Project,
        git_ref: &str,
    ) -> Result<Vec<Role>> {
        let paths = self.locator.locate(self.repo, git_ref)?;
        if paths.is_empty() {
            return Err(SyncError::NoConfigsFound {
                git_ref: git_ref.to_string(),
                searched: self.locator.describe(),
            });
        }

        let manifests = self.load_manifests(&paths, git_ref)?;
        if manifests.is_empty() {
            return Err(SyncError::NoConfigsFound {
                git_ref: git_ref.to_string(),
                searched: self.locator.describe(),
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;

            let pending = plan_roles(&*store, project, &manifests)?;
            if pending.is_empty() {
                tracing::debug!("All {} manifest(s) already seeded", manifests.len());
                return Ok(Vec::new());
            }

            match store.create_roles(&pending) {
                Ok(created) => {
                    tracing::info!(
                        "Seeded {} role(s) for project {} at {}",
                        created.len(),
                        project.permalink,
                        git_ref
                    );
                    return Ok(created);
                }
                Err(RegistryError::Conflict { field, value }) => {
                    if attempt >= self.max_attempts {
                        return Err(SyncError::NameConflict {
                            field,
                            value,
                            attempts: attempt,
                        });
                    }
                    tracing::warn!(
                        "{} '{}' was taken concurrently, retrying ({}/{})",
                        field,
                        value,
                        attempt,
                        self.max_attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch and validate every manifest, rejecting duplicate workloads
    fn load_manifests(&self, paths: &[String], git_ref: &str) -> Result<Vec<RoleManifest>> {
        let mut manifests = Vec::with_capacity(paths.len());
        let mut seen: HashMap<String, String> = HashMap::new();

        for path in paths {
            let Some(content) = self.repo.file_content(path, git_ref)? else {
                tracing::warn!("{} is listed at {} but has no content, skipping", path, git_ref);
                continue;
            };

            let manifest = RoleManifest::parse(path, &content)?;
            let identity = slugify(manifest.workload_name());

            if let Some(other) = seen.insert(identity.clone(), path.clone()) {
                return Err(SyncError::InvalidManifest {
                    path: path.clone(),
                    message: format!(
                        "workload name '{}' is already declared in {}",
                        identity, other
                    ),
                });
            }

            tracing::debug!("{} declares {} '{}'", path, manifest.workload_kind(), identity);
            manifests.push(manifest);
        }

        Ok(manifests)
    }
}

/// Work out the roles that need creating, with collision-free names
fn plan_roles(
    store: &dyn RoleStore,
    project: &Project,
    manifests: &[RoleManifest],
) -> Result<Vec<NewRole>> {
    let existing = store.active_roles_for_project(project.id)?;
    let mut names = NameReservations::default();
    let mut pending = Vec::new();

    for manifest in manifests {
        let name = slugify(manifest.workload_name());

        if existing
            .iter()
            .any(|r| !r.is_deleted() && (r.config_file == manifest.path() || r.name == name))
        {
            tracing::debug!("{} already has an active role", manifest.path());
            continue;
        }

        let resource_name = names.resource_name(store, project, manifest.workload_name())?;
        let service_name = manifest
            .service_name()
            .map(|service| names.service_name(store, service))
            .transpose()?;

        pending.push(NewRole::new(
            project.id,
            manifest.path(),
            name,
            resource_name,
            service_name,
        ));
    }

    Ok(pending)
}

/// Names handed out during one planning pass
#[derive(Default)]
struct NameReservations {
    resource_names: HashSet<String>,
    service_names: HashSet<String>,
}

impl NameReservations {
    fn resource_name(
        &mut self,
        store: &dyn RoleStore,
        project: &Project,
        workload_name: &str,
    ) -> Result<String> {
        let prefixed = slugify(&format!("{}-{}", project.permalink, workload_name));
        let mut candidate = slugify(workload_name);
        let mut n = 1;

        while self.resource_names.contains(&candidate) || store.resource_name_in_use(&candidate)? {
            n += 1;
            candidate = match n {
                2 => prefixed.clone(),
                _ => format!("{}-{}", prefixed, n - 1),
            };
        }

        self.resource_names.insert(candidate.clone());
        Ok(candidate)
    }

    fn service_name(&mut self, store: &dyn RoleStore, service: &str) -> Result<String> {
        let mut candidate = service.to_string();
        let mut n = 0;

        while self.service_names.contains(&candidate) || store.service_name_in_use(&candidate)? {
            n += 1;
            candidate = format!("{}{}{}", service, GENERATED_SERVICE_MARKER, n);
        }

        self.service_names.insert(candidate.clone());
        Ok(candidate)
    }
}
