//! JSON Schema validation
//!
//! Validation is always performed under Draft-07 rules. When an instance
//! fails, only the single most relevant error is reported: the one closest
//! to the root of the instance. Among equally shallow errors, a failed
//! `anyOf` or `oneOf` ranks below every other keyword; remaining ties go to
//! the error reported first.
//!
//! `jsonschema` does not expose the failing branches of a combinator, so a
//! combinator error is reported with its own message rather than the
//! message of its most specific sub-schema.

use crate::error::{SchemaError, SchemaResult};
use jsonschema::error::ValidationErrorKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Outcome of validating an instance against a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Validate `instance` against `schema`
///
/// # Returns
/// * `Ok(ValidationOutcome)` describing whether the instance conforms
/// * `Err(SchemaError::InvalidSchema)` if the schema cannot be compiled
///
/// # Example
/// ```rust,ignore
/// use serde_json::json;
/// use folio_schema::validate;
///
/// let schema = json!({"type": "object", "required": ["x"]});
/// let outcome = validate(&json!({"x": 1}), &schema)?;
/// assert!(outcome.is_valid);
/// ```
pub fn validate(instance: &JsonValue, schema: &JsonValue) -> SchemaResult<ValidationOutcome> {
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(schema)
        .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    let mut best: Option<((usize, bool), String)> = None;
    for error in validator.iter_errors(instance) {
        let path = error.instance_path.to_string();
        let rank = (pointer_depth(&path), is_combinator(&error.kind));
        if best.as_ref().is_some_and(|(best_rank, _)| *best_rank <= rank) {
            continue;
        }
        let message = if path.is_empty() {
            error.to_string()
        } else {
            format!("{} (at {})", error, path)
        };
        best = Some((rank, message));
    }

    Ok(match best {
        Some((_, message)) => ValidationOutcome::invalid(message),
        None => ValidationOutcome::valid(),
    })
}

fn is_combinator(kind: &ValidationErrorKind) -> bool {
    matches!(
        kind,
        ValidationErrorKind::AnyOf { .. }
            | ValidationErrorKind::OneOfNotValid { .. }
            | ValidationErrorKind::OneOfMultipleValid { .. }
    )
}

fn pointer_depth(pointer: &str) -> usize {
    pointer.split('/').filter(|segment| !segment.is_empty()).count()
}
