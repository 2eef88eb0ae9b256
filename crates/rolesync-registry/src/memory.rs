//! In-memory role store
//!
//! Keeps records behind a lock so clones share the same registry, which lets
//! tests model two writers racing on the same data.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rolesync_core::{
    CoreError, DeployGroupRole, DeployGroupRoleId, NewDeployGroupRole, NewRole, ProjectId, Role,
    RoleId,
};

use crate::RoleStore;
use crate::error::{RegistryError, Result, UniqueField};

#[derive(Debug, Default)]
struct State {
    roles: Vec<Role>,
    deploy_group_roles: Vec<DeployGroupRole>,
    next_role_id: RoleId,
    next_deploy_group_role_id: DeployGroupRoleId,
}

impl State {
    fn active(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|r| !r.is_deleted())
    }
}

/// In-memory implementation of [`RoleStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryRoleStore {
    state: Arc<RwLock<State>>,
}

impl MemoryRoleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| RegistryError::storage("role store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| RegistryError::storage("role store lock poisoned"))
    }

    /// Number of stored roles, deleted ones included
    pub fn role_count(&self) -> usize {
        self.read().map(|s| s.roles.len()).unwrap_or_default()
    }
}

impl RoleStore for MemoryRoleStore {
    fn active_roles_for_project(&self, project_id: ProjectId) -> Result<Vec<Role>> {
        let state = self.read()?;
        Ok(state
            .active()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    fn find_role(&self, id: RoleId) -> Result<Option<Role>> {
        let state = self.read()?;
        Ok(state.roles.iter().find(|r| r.id == id).cloned())
    }

    fn all_roles(&self) -> Result<Vec<Role>> {
        Ok(self.read()?.roles.clone())
    }

    fn resource_name_in_use(&self, resource_name: &str) -> Result<bool> {
        let state = self.read()?;
        Ok(state.active().any(|r| r.resource_name == resource_name))
    }

    fn service_name_in_use(&self, service_name: &str) -> Result<bool> {
        let state = self.read()?;
        Ok(state
            .active()
            .any(|r| r.service_name.as_deref() == Some(service_name)))
    }

    fn create_roles(&mut self, roles: &[NewRole]) -> Result<Vec<Role>> {
        for role in roles {
            role.validate()?;
        }

        let mut state = self.write()?;

        // Check the whole batch before touching anything
        let mut resource_names: HashSet<&str> =
            state.active().map(|r| r.resource_name.as_str()).collect();
        let mut service_names: HashSet<&str> = state
            .active()
            .filter_map(|r| r.service_name.as_deref())
            .collect();

        for role in roles {
            if !resource_names.insert(&role.resource_name) {
                return Err(RegistryError::Conflict {
                    field: UniqueField::ResourceName,
                    value: role.resource_name.clone(),
                });
            }
            if let Some(service_name) = role.service_name.as_deref() {
                if !service_names.insert(service_name) {
                    return Err(RegistryError::Conflict {
                        field: UniqueField::ServiceName,
                        value: service_name.to_string(),
                    });
                }
            }
        }
        drop(resource_names);
        drop(service_names);

        let now = Utc::now();
        let mut created = Vec::with_capacity(roles.len());
        for role in roles {
            state.next_role_id += 1;
            let record = Role {
                id: state.next_role_id,
                project_id: role.project_id,
                config_file: role.config_file.clone(),
                name: role.name.clone(),
                resource_name: role.resource_name.clone(),
                service_name: role.service_name.clone(),
                created_at: now,
                deleted_at: None,
            };
            state.roles.push(record.clone());
            created.push(record);
        }

        Ok(created)
    }

    fn soft_delete_role(&mut self, id: RoleId) -> Result<Role> {
        let mut state = self.write()?;

        let role = state
            .roles
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
            .ok_or(RegistryError::RoleNotFound { id })?;
        role.deleted_at = Some(Utc::now());
        let role = role.clone();

        state.deploy_group_roles.retain(|dgr| dgr.kubernetes_role_id != id);

        Ok(role)
    }

    fn create_deploy_group_role(&mut self, dgr: &NewDeployGroupRole) -> Result<DeployGroupRole> {
        dgr.validate()?;

        let mut state = self.write()?;

        let role = state
            .active()
            .find(|r| r.id == dgr.kubernetes_role_id)
            .ok_or(RegistryError::RoleNotFound {
                id: dgr.kubernetes_role_id,
            })?;
        if role.project_id != dgr.project_id {
            return Err(CoreError::InvalidDeployGroupRole {
                message: format!(
                    "role {} belongs to project {}, not {}",
                    role.id, role.project_id, dgr.project_id
                ),
            }
            .into());
        }

        if state.deploy_group_roles.iter().any(|existing| {
            existing.kubernetes_role_id == dgr.kubernetes_role_id
                && existing.deploy_group_id == dgr.deploy_group_id
        }) {
            return Err(RegistryError::Conflict {
                field: UniqueField::DeployGroup,
                value: dgr.deploy_group_id.to_string(),
            });
        }

        state.next_deploy_group_role_id += 1;
        let record = DeployGroupRole {
            id: state.next_deploy_group_role_id,
            project_id: dgr.project_id,
            kubernetes_role_id: dgr.kubernetes_role_id,
            deploy_group_id: dgr.deploy_group_id,
            cpu: dgr.cpu,
            ram: dgr.ram,
            replicas: dgr.replicas,
        };
        state.deploy_group_roles.push(record.clone());
        Ok(record)
    }

    fn deploy_group_roles_for_role(&self, role_id: RoleId) -> Result<Vec<DeployGroupRole>> {
        let state = self.read()?;
        Ok(state
            .deploy_group_roles
            .iter()
            .filter(|dgr| dgr.kubernetes_role_id == role_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_role(project_id: ProjectId, name: &str, service: Option<&str>) -> NewRole {
        NewRole::new(
            project_id,
            format!("kubernetes/{}.yml", name),
            name,
            name,
            service.map(String::from),
        )
    }

    fn override_for(role: &Role, deploy_group_id: i64) -> NewDeployGroupRole {
        NewDeployGroupRole {
            project_id: role.project_id,
            kubernetes_role_id: role.id,
            deploy_group_id,
            cpu: 1.0,
            ram: 10,
            replicas: 1,
        }
    }

    #[test]
    fn test_create_and_list() {
        let mut store = MemoryRoleStore::new();
        let created = store
            .create_roles(&[new_role(1, "web", Some("web")), new_role(1, "worker", None)])
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created[0].id < created[1].id);

        let roles = store.active_roles_for_project(1).unwrap();
        assert_eq!(roles, created);
        assert!(store.active_roles_for_project(2).unwrap().is_empty());
    }

    #[test]
    fn test_resource_name_conflict_across_projects() {
        let mut store = MemoryRoleStore::new();
        store.create_role(&new_role(1, "web", None)).unwrap();

        let err = store.create_role(&new_role(2, "web", None)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict {
                field: UniqueField::ResourceName,
                ..
            }
        ));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut store = MemoryRoleStore::new();
        let err = store
            .create_roles(&[new_role(1, "web", Some("svc")), new_role(1, "worker", Some("svc"))])
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.role_count(), 0);
    }

    #[test]
    fn test_invalid_role_is_rejected() {
        let mut store = MemoryRoleStore::new();
        let err = store.create_role(&new_role(1, "foo_bar", None)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn test_service_name_free_after_soft_delete() {
        let mut store = MemoryRoleStore::new();
        let web = store.create_role(&new_role(1, "web", Some("abc"))).unwrap();
        assert!(store.service_name_in_use("abc").unwrap());

        store.soft_delete_role(web.id).unwrap();
        assert!(!store.service_name_in_use("abc").unwrap());
        assert!(!store.resource_name_in_use("web").unwrap());

        store.create_role(&new_role(2, "web", Some("abc"))).unwrap();
        assert_eq!(store.all_roles().unwrap().len(), 2);
    }

    #[test]
    fn test_roles_without_service_do_not_conflict() {
        let mut store = MemoryRoleStore::new();
        store.create_role(&new_role(1, "a", None)).unwrap();
        store.create_role(&new_role(1, "b", None)).unwrap();
        assert_eq!(store.active_roles_for_project(1).unwrap().len(), 2);
    }

    #[test]
    fn test_soft_delete_cascades_to_deploy_group_roles() {
        let mut store = MemoryRoleStore::new();
        let role = store.create_role(&new_role(1, "web", None)).unwrap();
        store.create_deploy_group_role(&override_for(&role, 7)).unwrap();
        assert_eq!(store.deploy_group_roles_for_role(role.id).unwrap().len(), 1);

        let deleted = store.soft_delete_role(role.id).unwrap();
        assert!(deleted.is_deleted());
        assert!(store.deploy_group_roles_for_role(role.id).unwrap().is_empty());
        assert!(store.find_role(role.id).unwrap().unwrap().is_deleted());
    }

    #[test]
    fn test_soft_delete_twice_fails() {
        let mut store = MemoryRoleStore::new();
        let role = store.create_role(&new_role(1, "web", None)).unwrap();
        store.soft_delete_role(role.id).unwrap();
        assert!(matches!(
            store.soft_delete_role(role.id),
            Err(RegistryError::RoleNotFound { .. })
        ));
    }

    #[test]
    fn test_deploy_group_role_requires_active_role() {
        let mut store = MemoryRoleStore::new();
        let role = store.create_role(&new_role(1, "web", None)).unwrap();
        store.soft_delete_role(role.id).unwrap();

        let err = store
            .create_deploy_group_role(&override_for(&role, 7))
            .unwrap_err();
        assert!(matches!(err, RegistryError::RoleNotFound { .. }));
    }

    #[test]
    fn test_one_override_per_deploy_group() {
        let mut store = MemoryRoleStore::new();
        let role = store.create_role(&new_role(1, "web", None)).unwrap();
        store.create_deploy_group_role(&override_for(&role, 7)).unwrap();

        let err = store
            .create_deploy_group_role(&override_for(&role, 7))
            .unwrap_err();
        assert!(err.is_conflict());
        store.create_deploy_group_role(&override_for(&role, 8)).unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let mut store = MemoryRoleStore::new();
        let other = store.clone();
        store.create_role(&new_role(1, "web", None)).unwrap();
        assert!(other.resource_name_in_use("web").unwrap());
    }
}
