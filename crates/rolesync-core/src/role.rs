//! Role registry records
//!
//! - `Role`: a deployable unit of a project, backed by one manifest file
//! - `DeployGroupRole`: per deploy group override of a role's resources
//! - `Project`: the owner of roles, supplied by the caller

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub type ProjectId = i64;
pub type RoleId = i64;
pub type DeployGroupId = i64;
pub type DeployGroupRoleId = i64;

/// Maximum length of a Kubernetes object name
pub const MAX_NAME_LENGTH: usize = 253;

/// Lowercase alphanumerics and inner hyphens, as Kubernetes requires for names
static KUBE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

/// Whether `name` can be used as a Kubernetes object name
pub fn is_kube_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && KUBE_NAME_RE.is_match(name)
}

/// Turn arbitrary text into a Kubernetes-safe name fragment
///
/// Lowercases, replaces every other character (including `_`) with `-`,
/// collapses repeated hyphens and trims them from both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Project that owns roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// URL-safe identifier, used to disambiguate resource names
    pub permalink: String,
}

impl Project {
    pub fn new(id: ProjectId, permalink: impl Into<String>) -> Self {
        Self {
            id,
            permalink: permalink.into(),
        }
    }
}

/// A persisted role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub project_id: ProjectId,
    pub config_file: String,
    pub name: String,
    pub resource_name: String,
    pub service_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    /// Soft-deleted roles keep their row but take part in nothing
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A role that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub project_id: ProjectId,
    pub config_file: String,
    pub name: String,
    pub resource_name: String,
    pub service_name: Option<String>,
}

impl NewRole {
    /// Build a role, normalizing the config file path and service name
    pub fn new(
        project_id: ProjectId,
        config_file: impl AsRef<str>,
        name: impl Into<String>,
        resource_name: impl Into<String>,
        service_name: Option<String>,
    ) -> Self {
        Self {
            project_id,
            config_file: config_file.as_ref().trim().to_string(),
            name: name.into(),
            resource_name: resource_name.into(),
            service_name: normalize_service_name(service_name),
        }
    }

    /// Check field-level invariants
    ///
    /// Uniqueness is not checked here; the store enforces it on write.
    pub fn validate(&self) -> Result<()> {
        if self.config_file.trim().is_empty() {
            return Err(invalid_role("config_file can't be blank"));
        }
        if !is_kube_name(&self.name) {
            return Err(invalid_role(format!(
                "name '{}' must be lowercase alphanumerics and hyphens",
                self.name
            )));
        }
        if self.resource_name.trim().is_empty() {
            return Err(invalid_role("resource_name can't be blank"));
        }
        if !is_kube_name(&self.resource_name) {
            return Err(invalid_role(format!(
                "resource_name '{}' must be lowercase alphanumerics and hyphens",
                self.resource_name
            )));
        }
        if self
            .service_name
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(invalid_role("service_name can't be blank when set"));
        }
        Ok(())
    }
}

/// Store an empty service name as unset
pub fn normalize_service_name(service_name: Option<String>) -> Option<String> {
    service_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid_role(message: impl Into<String>) -> CoreError {
    CoreError::InvalidRole {
        message: message.into(),
    }
}

/// A persisted per deploy group override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployGroupRole {
    pub id: DeployGroupRoleId,
    pub project_id: ProjectId,
    pub kubernetes_role_id: RoleId,
    pub deploy_group_id: DeployGroupId,
    pub cpu: f64,
    pub ram: u64,
    pub replicas: u32,
}

/// An override that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeployGroupRole {
    pub project_id: ProjectId,
    pub kubernetes_role_id: RoleId,
    pub deploy_group_id: DeployGroupId,
    pub cpu: f64,
    pub ram: u64,
    pub replicas: u32,
}

impl NewDeployGroupRole {
    pub fn validate(&self) -> Result<()> {
        if !(self.cpu.is_finite() && self.cpu > 0.0) {
            return Err(CoreError::InvalidDeployGroupRole {
                message: format!("cpu must be greater than 0, got {}", self.cpu),
            });
        }
        if self.ram == 0 {
            return Err(CoreError::InvalidDeployGroupRole {
                message: "ram must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_role() -> NewRole {
        NewRole::new(1, "kubernetes/app_server.yml", "app-server", "test-app-server", None)
    }

    #[test]
    fn test_valid_role() {
        assert!(valid_role().validate().is_ok());
    }

    #[test]
    fn test_config_file_is_trimmed() {
        let role = NewRole::new(1, " whoops ", "app", "app", None);
        assert_eq!(role.config_file, "whoops");
    }

    #[test]
    fn test_blank_config_file_is_invalid() {
        let role = NewRole::new(1, "   ", "app", "app", None);
        assert!(role.validate().is_err());
    }

    #[test]
    fn test_empty_service_name_is_stored_as_none() {
        let role = NewRole::new(1, "a.yml", "app", "app", Some(String::new()));
        assert_eq!(role.service_name, None);
        assert!(role.validate().is_ok());
    }

    #[test]
    fn test_name_unusable_in_kubernetes() {
        let mut role = valid_role();
        role.name = "foo_bar".to_string();
        assert!(role.validate().is_err());
    }

    #[test]
    fn test_resource_name_rules() {
        let mut role = valid_role();
        role.resource_name = String::new();
        assert!(role.validate().is_err());

        role.resource_name = "dfssd".to_string();
        assert!(role.validate().is_ok());

        role.resource_name = "sfsdf__F".to_string();
        assert!(role.validate().is_err());
    }

    #[test]
    fn test_is_kube_name() {
        assert!(is_kube_name("a"));
        assert!(is_kube_name("web-1"));
        assert!(!is_kube_name("-web"));
        assert!(!is_kube_name("web-"));
        assert!(!is_kube_name("Web"));
        assert!(!is_kube_name("web.app"));
        assert!(!is_kube_name(""));
        assert!(!is_kube_name(&"a".repeat(MAX_NAME_LENGTH + 1)));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("foo_bar"), "foo-bar");
        assert_eq!(slugify("Foo Bar"), "foo-bar");
        assert_eq!(slugify("__a__b__"), "a-b");
        assert_eq!(slugify("test-app-server"), "test-app-server");
        assert_eq!(slugify("web.v2"), "web-v2");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_deleted_predicate() {
        let mut role = Role {
            id: 1,
            project_id: 1,
            config_file: "a.yml".to_string(),
            name: "a".to_string(),
            resource_name: "a".to_string(),
            service_name: None,
            created_at: Utc::now(),
            deleted_at: None,
        };
        assert!(!role.is_deleted());
        role.deleted_at = Some(Utc::now());
        assert!(role.is_deleted());
    }

    #[test]
    fn test_deploy_group_role_validation() {
        let mut dgr = NewDeployGroupRole {
            project_id: 1,
            kubernetes_role_id: 1,
            deploy_group_id: 2,
            cpu: 1.0,
            ram: 10,
            replicas: 1,
        };
        assert!(dgr.validate().is_ok());

        dgr.cpu = 0.0;
        assert!(dgr.validate().is_err());

        dgr.cpu = 0.5;
        dgr.ram = 0;
        assert!(dgr.validate().is_err());
    }
}
