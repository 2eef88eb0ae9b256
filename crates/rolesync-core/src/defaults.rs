//! Role resource defaults
//!
//! Derives the `{cpu, ram, replicas}` triple for a role from its manifest:
//! the first workload document wins, and its first container's resource
//! requests provide cpu and memory.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::manifest::{Document, document_kind};
use crate::quantity::{parse_memory_mib, parse_quantity};

/// Kinds that carry a pod template and can back a role
pub const WORKLOAD_KINDS: &[&str] = &["Deployment", "DaemonSet", "StatefulSet", "ReplicaSet", "Job"];

/// CPU used when the container declares none
pub const DEFAULT_CPU: f64 = 0.5;

/// Replica count used when the workload declares none
pub const DEFAULT_REPLICAS: u32 = 1;

/// Resource defaults derived from a manifest, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    pub cpu: f64,
    /// Memory in MiB; `None` when no usable quantity was declared
    pub ram: Option<u64>,
    pub replicas: u32,
}

/// Whether a kind is a workload kind
pub fn is_workload_kind(kind: &str) -> bool {
    WORKLOAD_KINDS.contains(&kind)
}

/// Index of the first workload document, if any
pub fn find_workload(documents: &[Document]) -> Option<usize> {
    documents
        .iter()
        .position(|doc| document_kind(doc).is_some_and(is_workload_kind))
}

/// The containers of a workload's pod template
///
/// Fails when the document does not have a usable pod template.
pub fn pod_containers<'a>(path: &str, workload: &'a Document) -> Result<&'a [JsonValue]> {
    let kind = document_kind(workload).unwrap_or("unknown");

    let containers = workload
        .get("spec")
        .and_then(|s| s.get("template"))
        .and_then(|t| t.get("spec"))
        .and_then(|s| s.get("containers"))
        .ok_or_else(|| {
            CoreError::invalid_manifest(
                path,
                format!("{} is missing spec.template.spec.containers", kind),
            )
        })?;

    let containers = containers.as_array().ok_or_else(|| {
        CoreError::invalid_manifest(
            path,
            format!("{} spec.template.spec.containers must be a list", kind),
        )
    })?;

    if containers.is_empty() {
        return Err(CoreError::invalid_manifest(
            path,
            format!("{} declares no containers", kind),
        ));
    }

    if let Some(idx) = containers.iter().position(|c| !c.is_object()) {
        return Err(CoreError::invalid_manifest(
            path,
            format!("{} container {} is not a mapping", kind, idx),
        ));
    }

    Ok(containers)
}

/// Extract defaults from parsed documents
///
/// Returns `Ok(None)` when no document is a workload. A workload with a
/// broken pod template is an error so the user can fix the manifest.
pub fn extract_defaults(path: &str, documents: &[Document]) -> Result<Option<Defaults>> {
    let Some(idx) = find_workload(documents) else {
        return Ok(None);
    };
    let workload = &documents[idx];
    let containers = pod_containers(path, workload)?;

    let resources = containers[0].get("resources");
    let requested = |key: &str| {
        resources
            .and_then(|r| r.get("requests"))
            .and_then(|r| r.get(key))
            .or_else(|| {
                resources
                    .and_then(|r| r.get("limits"))
                    .and_then(|r| r.get(key))
            })
    };

    let cpu = requested("cpu").and_then(cpu_value).unwrap_or(DEFAULT_CPU);
    let ram = requested("memory").and_then(memory_value);

    let replicas = workload
        .get("spec")
        .and_then(|s| s.get("replicas"))
        .and_then(JsonValue::as_u64)
        .and_then(|r| u32::try_from(r).ok())
        .unwrap_or(DEFAULT_REPLICAS);

    Ok(Some(Defaults { cpu, ram, replicas }))
}

fn cpu_value(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_quantity(s),
        _ => None,
    }
}

fn memory_value(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => parse_memory_mib(&n.to_string()),
        JsonValue::String(s) => parse_memory_mib(s),
        _ => None,
    }
}
