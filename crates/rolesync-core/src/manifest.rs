//! Manifest document parsing
//!
//! A manifest file holds one or more Kubernetes objects. Two on-disk shapes are
//! accepted and both are normalized into the same ordered list of documents:
//!
//! - **YAML** (`.yml`, `.yaml`): a multi-document stream separated by `---`
//! - **JSON** (`.json`): a single object, or an array of objects

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// A single parsed manifest document
pub type Document = Map<String, JsonValue>;

/// On-disk manifest format, determined from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Multi-document YAML stream
    Yaml,
    /// Single JSON object or array of objects
    Json,
}

impl ManifestFormat {
    /// Determine the format from a repository-relative path
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "yml" | "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(CoreError::UnsupportedFormat {
                path: path.to_string(),
            }),
        }
    }

    /// Whether a path has an extension this parser understands
    pub fn is_supported(path: &str) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// Parse manifest text into its documents, using the path to pick the format
pub fn parse_documents(path: &str, content: &str) -> Result<Vec<Document>> {
    match ManifestFormat::from_path(path)? {
        ManifestFormat::Yaml => parse_yaml_stream(path, content),
        ManifestFormat::Json => parse_json(path, content),
    }
}

fn parse_yaml_stream(path: &str, content: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for (idx, de) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = JsonValue::deserialize(de)
            .map_err(|e| CoreError::parse(path, format!("document {}: {}", idx + 1, e)))?;

        match value {
            JsonValue::Null => continue,
            JsonValue::Object(map) => documents.push(map),
            other => {
                return Err(CoreError::parse(
                    path,
                    format!(
                        "document {} is a {}, expected a mapping",
                        idx + 1,
                        value_type_name(&other)
                    ),
                ));
            }
        }
    }

    Ok(documents)
}

fn parse_json(path: &str, content: &str) -> Result<Vec<Document>> {
    let value: JsonValue = serde_json::from_str(content).map_err(|e| CoreError::parse(path, e))?;

    match value {
        JsonValue::Object(map) => Ok(vec![map]),
        JsonValue::Array(items) => {
            let mut documents = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    JsonValue::Null => continue,
                    JsonValue::Object(map) => documents.push(map),
                    other => {
                        return Err(CoreError::parse(
                            path,
                            format!(
                                "element {} is a {}, expected an object",
                                idx,
                                value_type_name(&other)
                            ),
                        ));
                    }
                }
            }
            Ok(documents)
        }
        other => Err(CoreError::parse(
            path,
            format!(
                "top-level value is a {}, expected an object or array",
                value_type_name(&other)
            ),
        )),
    }
}

/// The `kind` of a document, if declared
pub fn document_kind(doc: &Document) -> Option<&str> {
    doc.get("kind").and_then(JsonValue::as_str)
}

/// The `metadata.name` of a document, if declared
pub fn metadata_name(doc: &Document) -> Option<&str> {
    doc.get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(JsonValue::as_str)
}

fn value_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path("kubernetes/a.yml").unwrap(), ManifestFormat::Yaml);
        assert_eq!(ManifestFormat::from_path("kubernetes/a.YAML").unwrap(), ManifestFormat::Yaml);
        assert_eq!(ManifestFormat::from_path("kubernetes/a.json").unwrap(), ManifestFormat::Json);
        assert!(matches!(
            ManifestFormat::from_path("kubernetes/a.toml"),
            Err(CoreError::UnsupportedFormat { .. })
        ));
        assert!(!ManifestFormat::is_supported("Makefile"));
    }

    #[test]
    fn test_yaml_multi_document_stream() {
        let yaml = r#"
kind: Deployment
metadata:
  name: web
---
kind: Service
metadata:
  name: web-svc
"#;
        let docs = parse_documents("a.yml", yaml).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(document_kind(&docs[0]), Some("Deployment"));
        assert_eq!(metadata_name(&docs[1]), Some("web-svc"));
    }

    #[test]
    fn test_yaml_skips_empty_documents() {
        let yaml = "---\n---\nkind: ConfigMap\n---\n# only a comment\n";
        let docs = parse_documents("a.yaml", yaml).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(document_kind(&docs[0]), Some("ConfigMap"));
    }

    #[test]
    fn test_yaml_rejects_scalar_document() {
        let err = parse_documents("a.yml", "just a string").unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn test_yaml_invalid_syntax() {
        let err = parse_documents("a.yml", "kind: [unclosed").unwrap_err();
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_json_single_object() {
        let docs = parse_documents("a.json", r#"{"kind": "Job"}"#).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(document_kind(&docs[0]), Some("Job"));
    }

    #[test]
    fn test_json_array_of_objects() {
        let json = r#"[{"kind": "Deployment"}, null, {"kind": "Service"}]"#;
        let docs = parse_documents("a.json", json).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(document_kind(&docs[1]), Some("Service"));
    }

    #[test]
    fn test_json_rejects_scalars() {
        assert!(parse_documents("a.json", "42").is_err());
        assert!(parse_documents("a.json", r#"[{"kind": "Job"}, 1]"#).is_err());
        assert!(parse_documents("a.json", "{not json").is_err());
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = parse_documents("kubernetes/a.txt", "kind: Job").unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Unsupported manifest format: kubernetes/a.txt (expected .yml, .yaml or .json)"
        );
    }
}
