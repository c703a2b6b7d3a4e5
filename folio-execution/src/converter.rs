//! Document rendering
//!
//! The raw form of a document is its pretty-printed JSON. The HTML form is a
//! standalone page; report mode omits code inputs and execution prompts.

use folio_core::{Cell, Document, FolioResult};
use folio_interfaces::DocumentConverter;
use serde_json::Value as JsonValue;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto}\
.cell{margin:1em 0}.prompt{color:#888;font-family:monospace}\
pre{background:#f7f7f7;padding:.5em;overflow-x:auto}\
.error pre{background:#fdd}";

/// Renders documents to JSON text and HTML
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        Self
    }

    fn render_cell(&self, html: &mut String, cell: &Cell, report_mode: bool) {
        if cell.is_code() {
            if report_mode && cell.outputs().is_empty() {
                return;
            }
            html.push_str("<div class=\"cell code\">\n");
            if !report_mode {
                let prompt = cell
                    .extra
                    .get("execution_count")
                    .and_then(JsonValue::as_u64)
                    .map(|count| count.to_string())
                    .unwrap_or_default();
                let _ = writeln!(
                    html,
                    "<div class=\"prompt\">In [{}]:</div>\n<pre class=\"input\">{}</pre>",
                    prompt,
                    escape_html(&cell.source)
                );
            }
            for output in cell.outputs() {
                render_output(html, output);
            }
            html.push_str("</div>\n");
        } else if cell.cell_type == "markdown" {
            let _ = writeln!(
                html,
                "<div class=\"cell markdown\"><pre>{}</pre></div>",
                escape_html(&cell.source)
            );
        } else if !report_mode {
            let _ = writeln!(
                html,
                "<div class=\"cell raw\"><pre>{}</pre></div>",
                escape_html(&cell.source)
            );
        }
    }
}

impl DocumentConverter for HtmlConverter {
    fn to_raw(&self, document: &Document) -> FolioResult<String> {
        document.to_json_string()
    }

    fn to_html(&self, document: &Document, report_mode: bool) -> FolioResult<String> {
        let title = document
            .metadata
            .get("title")
            .and_then(JsonValue::as_str)
            .unwrap_or("Document");

        let mut html = String::new();
        let _ = writeln!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>",
            escape_html(title),
            STYLE
        );
        for cell in &document.cells {
            self.render_cell(&mut html, cell, report_mode);
        }
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

fn render_output(html: &mut String, output: &JsonValue) {
    let output_type = output
        .get("output_type")
        .and_then(JsonValue::as_str)
        .unwrap_or_default();

    match output_type {
        "stream" => {
            let _ = writeln!(
                html,
                "<pre class=\"output stream\">{}</pre>",
                escape_html(&text_of(output.get("text")))
            );
        }
        "error" => {
            let traceback = output
                .get("traceback")
                .map(|lines| text_lines(Some(lines)))
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "{}: {}",
                        text_of(output.get("ename")),
                        text_of(output.get("evalue"))
                    )
                });
            let _ = writeln!(
                html,
                "<div class=\"output error\"><pre>{}</pre></div>",
                escape_html(&traceback)
            );
        }
        _ => {
            if let Some(data) = output.get("data") {
                render_data(html, data);
            }
        }
    }
}

fn render_data(html: &mut String, data: &JsonValue) {
    if let Some(markup) = data.get("text/html") {
        let _ = writeln!(html, "<div class=\"output html\">{}</div>", text_of(Some(markup)));
    } else if let Some(image) = data.get("image/png") {
        let _ = writeln!(
            html,
            "<div class=\"output image\"><img src=\"data:image/png;base64,{}\"></div>",
            text_of(Some(image)).trim()
        );
    } else if let Some(json) = data.get("application/json") {
        let pretty = serde_json::to_string_pretty(json).unwrap_or_default();
        let _ = writeln!(html, "<pre class=\"output json\">{}</pre>", escape_html(&pretty));
    } else if let Some(text) = data.get("text/plain") {
        let _ = writeln!(
            html,
            "<pre class=\"output text\">{}</pre>",
            escape_html(&text_of(Some(text)))
        );
    }
}

/// nbformat text fields are a string or a list of lines
fn text_of(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::String(text)) => text.clone(),
        Some(JsonValue::Array(lines)) => lines.iter().filter_map(JsonValue::as_str).collect(),
        _ => String::new(),
    }
}

/// Tracebacks are lists of lines without trailing newlines
fn text_lines(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::Array(lines)) => lines
            .iter()
            .filter_map(JsonValue::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => text_of(other),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
