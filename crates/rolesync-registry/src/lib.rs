//! Rolesync Registry - persistent storage for roles
//!
//! Two stores implement the same [`RoleStore`] contract:
//! - **Memory**: in-process, used by tests and one-shot tooling
//! - **SQLite**: durable, uniqueness enforced by partial unique indexes
//!
//! ## Invariants
//!
//! - `resource_name` and `service_name` are unique among non-deleted roles,
//!   across all projects. A write that would break this fails with
//!   [`RegistryError::Conflict`].
//! - Soft-deleting a role removes its deploy group overrides in the same
//!   unit of work.
//! - Soft-deleted roles are filtered with an explicit `deleted_at` check at
//!   every query site.

pub mod error;
mod memory;
mod sqlite;

pub use error::{RegistryError, Result, UniqueField};
pub use memory::MemoryRoleStore;
pub use sqlite::SqliteRoleStore;

use rolesync_core::{DeployGroupRole, NewDeployGroupRole, NewRole, ProjectId, Role, RoleId};

/// Storage boundary for role records
pub trait RoleStore {
    /// Non-deleted roles of a project, ordered by id
    fn active_roles_for_project(&self, project_id: ProjectId) -> Result<Vec<Role>>;

    /// A role by id, deleted or not
    fn find_role(&self, id: RoleId) -> Result<Option<Role>>;

    /// Every role including deleted ones, ordered by id
    fn all_roles(&self) -> Result<Vec<Role>>;

    /// Whether a non-deleted role in any project uses this resource name
    fn resource_name_in_use(&self, resource_name: &str) -> Result<bool>;

    /// Whether a non-deleted role in any project uses this service name
    fn service_name_in_use(&self, service_name: &str) -> Result<bool>;

    /// Create roles atomically: either all are persisted or none
    fn create_roles(&mut self, roles: &[NewRole]) -> Result<Vec<Role>>;

    /// Soft-delete a role and remove its deploy group overrides
    fn soft_delete_role(&mut self, id: RoleId) -> Result<Role>;

    /// Create a deploy group override for an active role
    fn create_deploy_group_role(&mut self, dgr: &NewDeployGroupRole) -> Result<DeployGroupRole>;

    /// Deploy group overrides of a role, ordered by id
    fn deploy_group_roles_for_role(&self, role_id: RoleId) -> Result<Vec<DeployGroupRole>>;

    /// Create a single role
    fn create_role(&mut self, role: &NewRole) -> Result<Role> {
        self.create_roles(std::slice::from_ref(role))?
            .pop()
            .ok_or_else(|| RegistryError::storage("role was not created"))
    }
}
