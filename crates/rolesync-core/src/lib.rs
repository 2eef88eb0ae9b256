//! Rolesync Core - Core types for discovering deployable roles
//!
//! This crate provides the pure building blocks used throughout rolesync:
//! - `manifest`: parse YAML streams and JSON bodies into documents
//! - `quantity`: convert resource quantities such as `100Mi` or `500m`
//! - `defaults`: derive `{cpu, ram, replicas}` from a workload
//! - `RoleManifest`: a manifest checked to describe exactly one role
//! - `Role`, `DeployGroupRole`: registry records and their validation

pub mod error;
pub mod manifest;
pub mod quantity;
pub mod defaults;
pub mod role_manifest;
pub mod role;

pub use error::{CoreError, Result};
pub use manifest::{Document, ManifestFormat, document_kind, metadata_name, parse_documents};
pub use quantity::{parse_memory_mib, parse_quantity};
pub use defaults::{DEFAULT_CPU, DEFAULT_REPLICAS, Defaults, WORKLOAD_KINDS, extract_defaults};
pub use role_manifest::RoleManifest;
pub use role::{
    DeployGroupId, DeployGroupRole, DeployGroupRoleId, NewDeployGroupRole, NewRole, Project,
    ProjectId, Role, RoleId, is_kube_name, normalize_service_name, slugify,
};
