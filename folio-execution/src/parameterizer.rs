//! Parameter injection into notebook templates

use folio_core::{Cell, Document, FolioResult};
use folio_interfaces::DocumentParameterizer;
use folio_schema::BoundValue;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

/// Tag marking the template cell that holds default parameter values
pub const PARAMETERS_TAG: &str = "parameters";

/// Tag of the generated cell holding the job's parameters
pub const INJECTED_PARAMETERS_TAG: &str = "injected-parameters";

const METADATA_KEY: &str = "folio";

/// Injects parameters as an assignment cell after the `parameters` cell
///
/// Only top-level parameters whose names are identifiers get an assignment.
/// The full raw and bound parameters are always recorded in
/// `metadata.folio`.
#[derive(Debug, Clone)]
pub struct NotebookParameterizer {
    default_language: String,
}

impl Default for NotebookParameterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NotebookParameterizer {
    pub fn new() -> Self {
        Self::with_default_language("python")
    }

    /// Language assumed for documents that declare none
    pub fn with_default_language(language: impl Into<String>) -> Self {
        Self {
            default_language: language.into(),
        }
    }
}

impl DocumentParameterizer for NotebookParameterizer {
    fn parameterize(
        &self,
        mut document: Document,
        bound: &BoundValue,
        raw: &Map<String, JsonValue>,
    ) -> FolioResult<Document> {
        let bound = bound.to_json()?;
        let python = document
            .language()
            .unwrap_or(self.default_language.as_str())
            .eq_ignore_ascii_case("python");

        let mut lines = vec!["# Parameters".to_string()];
        if let JsonValue::Object(fields) = &bound {
            for (name, value) in fields {
                if !is_identifier(name) {
                    debug!(parameter = %name, "Skipping parameter that is not an identifier");
                    continue;
                }
                let literal = if python {
                    python_literal(value)
                } else {
                    value.to_string()
                };
                lines.push(format!("{} = {}", name, literal));
            }
        }

        document
            .cells
            .retain(|cell| !cell.has_tag(INJECTED_PARAMETERS_TAG));
        let position = document
            .position_of_tag(PARAMETERS_TAG)
            .map_or(0, |index| index + 1);
        document.cells.insert(
            position,
            Cell::code(lines.join("\n") + "\n", &[INJECTED_PARAMETERS_TAG]),
        );

        document.metadata.insert(
            METADATA_KEY.to_string(),
            json!({
                "parameters": raw,
                "bound_parameters": bound,
            }),
        );
        Ok(document)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn python_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "None".to_string(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        JsonValue::Number(_) | JsonValue::String(_) => value.to_string(),
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        JsonValue::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, value)| {
                    format!("{}: {}", JsonValue::from(key.as_str()), python_literal(value))
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}
