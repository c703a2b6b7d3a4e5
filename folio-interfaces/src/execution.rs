//! Execution interface definitions
//!
//! The document pipeline of a job: parameterize the template, execute it,
//! then read its output and render it.

use async_trait::async_trait;
use folio_core::{Document, FolioResult, JobId};
use folio_schema::BoundValue;
use serde_json::{Map, Value as JsonValue};

/// Outcome of running a document
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// The document after execution, with outputs
    pub document: Document,
    /// Set when the document's own code failed
    pub exception: Option<String>,
}

impl ExecutionReport {
    pub fn succeeded(document: Document) -> Self {
        Self {
            document,
            exception: None,
        }
    }

    pub fn failed(document: Document, exception: impl Into<String>) -> Self {
        Self {
            document,
            exception: Some(exception.into()),
        }
    }
}

/// Runs a parameterized document
///
/// A failure of the document's own code is reported through
/// [`ExecutionReport::exception`]. An `Err` means the executor itself broke
/// and leads the job to `InternalError`.
#[async_trait]
pub trait DocumentExecutor: Send + Sync {
    async fn execute(&self, document: Document) -> FolioResult<ExecutionReport>;
}

/// Injects bound parameters into a document template
pub trait DocumentParameterizer: Send + Sync {
    /// `raw` are the parameters as received, recorded in the document
    /// metadata; `bound` is what the document's code sees.
    fn parameterize(
        &self,
        document: Document,
        bound: &BoundValue,
        raw: &Map<String, JsonValue>,
    ) -> FolioResult<Document>;
}

/// Renders an executed document
pub trait DocumentConverter: Send + Sync {
    fn to_raw(&self, document: &Document) -> FolioResult<String>;

    /// `report_mode` hides inputs
    fn to_html(&self, document: &Document, report_mode: bool) -> FolioResult<String>;
}

/// Extracts the structured output of an executed document
pub trait OutputReader: Send + Sync {
    /// The output as JSON text, if the document emitted one
    fn read_output(&self, document: &Document) -> FolioResult<Option<String>>;
}

/// Schedules `complete` for an accepted job
#[async_trait]
pub trait TaskHandoff: Send + Sync {
    async fn submit(&self, job_id: &JobId) -> FolioResult<()>;
}
