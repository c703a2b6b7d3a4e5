//! Job type configuration

use crate::error::FolioResult;
use folio_schema::SchemaBinder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Sidecar descriptor of a job type as written on disk
///
/// Both schemas default to the empty schema, which accepts anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTypeDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "empty_schema")]
    pub input: JsonValue,
    #[serde(default = "empty_schema")]
    pub output: JsonValue,
}

impl Default for JobTypeDescriptor {
    fn default() -> Self {
        Self {
            id: None,
            input: empty_schema(),
            output: empty_schema(),
        }
    }
}

fn empty_schema() -> JsonValue {
    json!({})
}

/// A loaded job type
///
/// The unresolved schemas keep their `typed://` references for binding;
/// the resolved schemas are self-contained and used for validation and
/// for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeConfig {
    pub id: String,
    pub document_path: String,
    pub input_schema: JsonValue,
    pub output_schema: JsonValue,
    pub resolved_input_schema: JsonValue,
    pub resolved_output_schema: JsonValue,
}

impl JobTypeConfig {
    /// Build a job type from its descriptor, resolving both schemas
    pub fn resolve(
        id: impl Into<String>,
        document_path: impl Into<String>,
        descriptor: JobTypeDescriptor,
        binder: &SchemaBinder,
    ) -> FolioResult<Self> {
        let resolved_input_schema = binder.resolve(&descriptor.input)?;
        let resolved_output_schema = binder.resolve(&descriptor.output)?;
        Ok(Self {
            id: id.into(),
            document_path: document_path.into(),
            input_schema: descriptor.input,
            output_schema: descriptor.output,
            resolved_input_schema,
            resolved_output_schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{register_domain_types, Artifact};
    use folio_schema::TypeRegistry;
    use std::sync::Arc;

    fn binder() -> SchemaBinder {
        let mut registry = TypeRegistry::new();
        register_domain_types(&mut registry);
        SchemaBinder::new(Arc::new(registry))
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor: JobTypeDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(descriptor, JobTypeDescriptor::default());
        assert_eq!(descriptor.input, json!({}));
    }

    #[test]
    fn test_resolve_job_type() {
        let descriptor = JobTypeDescriptor {
            id: None,
            input: json!({
                "type": "object",
                "properties": {"source": {"$ref": "typed://folio.Artifact"}}
            }),
            output: json!({"type": "array"}),
        };

        let config = JobTypeConfig::resolve("copy", "copy.ipynb", descriptor, &binder()).unwrap();

        assert_eq!(config.input_schema["properties"]["source"]["$ref"], "typed://folio.Artifact");
        assert_eq!(
            config.resolved_input_schema["properties"]["source"]["$ref"],
            "#/definitions/folio.Artifact"
        );
        assert_eq!(config.resolved_output_schema, json!({"type": "array"}));

        let artifact = folio_schema::named::to_tagged_value(&Artifact::new("file", "a.txt")).unwrap();
        let outcome = binder()
            .validate(&json!({"source": artifact}), &config.resolved_input_schema)
            .unwrap();
        assert!(outcome.is_valid, "{outcome:?}");
    }

    #[test]
    fn test_resolve_unknown_type_fails() {
        let descriptor = JobTypeDescriptor {
            input: json!({"$ref": "typed://folio.Nope"}),
            ..Default::default()
        };
        assert!(JobTypeConfig::resolve("x", "x.ipynb", descriptor, &binder()).is_err());
    }
}
