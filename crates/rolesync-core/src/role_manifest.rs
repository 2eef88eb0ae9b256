//! Validated view of a role's manifest file
//!
//! A role manifest holds exactly one workload (Deployment, Job, ...) and at
//! most one Service. Anything else in the file (ConfigMaps, ...) is carried
//! along untouched.

use crate::defaults::{Defaults, extract_defaults, is_workload_kind, pod_containers};
use crate::error::{CoreError, Result};
use crate::manifest::{Document, document_kind, metadata_name, parse_documents};

/// Kind of the optional network service document
pub const SERVICE_KIND: &str = "Service";

/// A manifest file that has been checked to describe a single role
#[derive(Debug, Clone)]
pub struct RoleManifest {
    path: String,
    documents: Vec<Document>,
    workload: usize,
    service: Option<usize>,
}

impl RoleManifest {
    /// Parse and validate manifest text
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        let documents = parse_documents(path, content)?;
        Self::from_documents(path, documents)
    }

    /// Validate already-parsed documents
    pub fn from_documents(path: &str, documents: Vec<Document>) -> Result<Self> {
        let workloads: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| document_kind(doc).is_some_and(is_workload_kind))
            .map(|(idx, _)| idx)
            .collect();

        let workload = match workloads.as_slice() {
            [] => {
                return Err(CoreError::invalid_manifest(
                    path,
                    "no Deployment, DaemonSet, StatefulSet, ReplicaSet or Job found",
                ));
            }
            [single] => *single,
            many => {
                return Err(CoreError::invalid_manifest(
                    path,
                    format!(
                        "contains {} workload documents, a role needs exactly one",
                        many.len()
                    ),
                ));
            }
        };

        let name = metadata_name(&documents[workload]).unwrap_or("");
        if name.trim().is_empty() {
            return Err(CoreError::invalid_manifest(
                path,
                "workload is missing metadata.name",
            ));
        }

        pod_containers(path, &documents[workload])?;

        let services: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| document_kind(doc) == Some(SERVICE_KIND))
            .map(|(idx, _)| idx)
            .collect();
        if services.len() > 1 {
            return Err(CoreError::invalid_manifest(
                path,
                format!("contains {} Service documents, at most one is supported", services.len()),
            ));
        }

        Ok(Self {
            path: path.to_string(),
            documents,
            workload,
            service: services.first().copied(),
        })
    }

    /// Repository-relative path of the file
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All documents in file order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The workload document
    pub fn workload(&self) -> &Document {
        &self.documents[self.workload]
    }

    /// Kind of the workload document
    pub fn workload_kind(&self) -> &str {
        document_kind(self.workload()).unwrap_or_default()
    }

    /// Declared `metadata.name` of the workload
    pub fn workload_name(&self) -> &str {
        metadata_name(self.workload()).unwrap_or_default().trim()
    }

    /// The service document, if the manifest declares one
    pub fn service(&self) -> Option<&Document> {
        self.service.map(|idx| &self.documents[idx])
    }

    /// Declared name of the service; empty names count as absent
    pub fn service_name(&self) -> Option<&str> {
        self.service()
            .and_then(metadata_name)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Resource defaults for this manifest
    pub fn defaults(&self) -> Result<Option<Defaults>> {
        extract_defaults(&self.path, &self.documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE: &str = r#"
kind: Deployment
metadata:
  name: test-app-server
spec:
  template:
    spec:
      containers:
      - name: app
        image: test
---
kind: Service
metadata:
  name: test-app-server-svc
"#;

    #[test]
    fn test_parse_valid_role() {
        let manifest = RoleManifest::parse("kubernetes/a.yml", ROLE).unwrap();
        assert_eq!(manifest.path(), "kubernetes/a.yml");
        assert_eq!(manifest.workload_kind(), "Deployment");
        assert_eq!(manifest.workload_name(), "test-app-server");
        assert_eq!(manifest.service_name(), Some("test-app-server-svc"));
        assert_eq!(manifest.documents().len(), 2);
    }

    #[test]
    fn test_without_service() {
        let yaml = ROLE.split("---").next().unwrap();
        let manifest = RoleManifest::parse("kubernetes/a.yml", yaml).unwrap();
        assert!(manifest.service().is_none());
        assert_eq!(manifest.service_name(), None);
    }

    #[test]
    fn test_empty_service_name_is_absent() {
        let yaml = ROLE.replace("name: test-app-server-svc", "name: ''");
        let manifest = RoleManifest::parse("kubernetes/a.yml", &yaml).unwrap();
        assert!(manifest.service().is_some());
        assert_eq!(manifest.service_name(), None);
    }

    #[test]
    fn test_unknown_kind_is_invalid() {
        let yaml = ROLE.replace("Deployment", "Broken");
        let err = RoleManifest::parse("kubernetes/a.yml", &yaml).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Invalid manifest kubernetes/a.yml: no Deployment, DaemonSet, StatefulSet, ReplicaSet or Job found"
        );
    }

    #[test]
    fn test_duplicate_workload_is_invalid() {
        let workload = ROLE.split("---").next().unwrap();
        let yaml = format!("{}---{}", ROLE, workload);
        let err = RoleManifest::parse("kubernetes/a.yml", &yaml).unwrap_err();
        assert!(err.to_string().contains("2 workload documents"));
    }

    #[test]
    fn test_two_services_are_invalid() {
        let service = ROLE.split("---").nth(1).unwrap();
        let yaml = format!("{}---{}", ROLE, service);
        assert!(RoleManifest::parse("kubernetes/a.yml", &yaml).is_err());
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let yaml = ROLE.replace("name: test-app-server\n", "labels: {}\n");
        let err = RoleManifest::parse("kubernetes/a.yml", &yaml).unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }

    #[test]
    fn test_missing_containers_is_invalid() {
        let yaml = "kind: Job\nmetadata:\n  name: job-role\nspec: {}\n";
        let err = RoleManifest::parse("kubernetes/job.yml", yaml).unwrap_err();
        assert!(matches!(err, CoreError::InvalidManifest { .. }));
    }

    #[test]
    fn test_parse_errors_pass_through() {
        let err = RoleManifest::parse("kubernetes/a.json", "{oops").unwrap_err();
        assert!(err.is_parse_failure());
    }
}
