//! Structured output extraction
//!
//! A document emits its output as a display output carrying the
//! [`OUTPUT_MIME_TYPE`] bundle, either as JSON text or as a JSON value. When
//! several are emitted the last one wins.

use folio_core::{Document, FolioResult};
use folio_interfaces::OutputReader;
use serde_json::{json, Map, Value as JsonValue};

pub const OUTPUT_MIME_TYPE: &str = "application/vnd.folio.output+json";

/// Reads the output bundle from a notebook document
#[derive(Debug, Clone, Default)]
pub struct NotebookOutputReader;

impl NotebookOutputReader {
    pub fn new() -> Self {
        Self
    }
}

impl OutputReader for NotebookOutputReader {
    fn read_output(&self, document: &Document) -> FolioResult<Option<String>> {
        let value = document
            .outputs()
            .filter_map(|output| output.get("data"))
            .filter_map(|data| data.get(OUTPUT_MIME_TYPE))
            .last();

        match value {
            Some(JsonValue::String(text)) => Ok(Some(text.clone())),
            Some(value) => Ok(Some(serde_json::to_string(value)?)),
            None => Ok(None),
        }
    }
}

/// A `display_data` output carrying `value` as the document output
pub fn output_display_data(value: JsonValue) -> JsonValue {
    let mut data = Map::new();
    data.insert(OUTPUT_MIME_TYPE.to_string(), value);
    json!({
        "output_type": "display_data",
        "metadata": {},
        "data": data,
    })
}
