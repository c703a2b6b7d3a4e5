//! Notebook-style documents
//!
//! A document is an nbformat-like JSON structure: top-level `metadata`, an
//! ordered list of `cells`, and whatever other fields the format carries
//! (`nbformat`, `nbformat_minor`), which are kept as-is.

use crate::error::FolioResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// A single document cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
    #[serde(default, deserialize_with = "multiline_text")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<JsonValue>>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Cell {
    /// A code cell with no outputs
    pub fn code(source: impl Into<String>, tags: &[&str]) -> Self {
        let mut metadata = Map::new();
        if !tags.is_empty() {
            metadata.insert("tags".to_string(), json!(tags));
        }
        let mut extra = Map::new();
        extra.insert("execution_count".to_string(), JsonValue::Null);
        Self {
            cell_type: "code".to_string(),
            metadata,
            source: source.into(),
            outputs: Some(Vec::new()),
            extra,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: "markdown".to_string(),
            metadata: Map::new(),
            source: source.into(),
            outputs: None,
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.metadata
            .get("tags")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
            .filter_map(JsonValue::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }

    pub fn outputs(&self) -> &[JsonValue] {
        self.outputs.as_deref().unwrap_or_default()
    }
}

/// nbformat allows text as a string or as a list of lines
fn multiline_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Single(String),
        Lines(Vec<String>),
    }

    Ok(match Option::<Text>::deserialize(deserializer)? {
        Some(Text::Single(text)) => text,
        Some(Text::Lines(lines)) => lines.concat(),
        None => String::new(),
    })
}

/// A notebook-like document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for Document {
    fn default() -> Self {
        let mut extra = Map::new();
        extra.insert("nbformat".to_string(), json!(4));
        extra.insert("nbformat_minor".to_string(), json!(5));
        Self {
            metadata: Map::new(),
            cells: Vec::new(),
            extra,
        }
    }
}

impl Document {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Default::default()
        }
    }

    pub fn from_json_str(raw: &str) -> FolioResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json(value: JsonValue) -> FolioResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_string(&self) -> FolioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Kernel language, if the document declares one
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|spec| spec.get("language"))
            .or_else(|| {
                self.metadata
                    .get("language_info")
                    .and_then(|info| info.get("name"))
            })
            .and_then(JsonValue::as_str)
    }

    /// Index of the first cell carrying `tag`
    pub fn position_of_tag(&self, tag: &str) -> Option<usize> {
        self.cells.iter().position(|cell| cell.has_tag(tag))
    }

    /// All outputs of all cells, in document order
    pub fn outputs(&self) -> impl Iterator<Item = &JsonValue> {
        self.cells.iter().flat_map(|cell| cell.outputs().iter())
    }
}
