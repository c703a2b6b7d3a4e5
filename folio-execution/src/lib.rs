//! Folio execution engine
//!
//! - [`LifecycleEngine`]: `accept`, `begin` and `complete` for execution jobs
//! - [`QueueHandoff`] / [`ExecutionWorker`]: in-process handoff between
//!   `begin` and `complete` with bounded concurrency
//! - Notebook tooling: [`NotebookParameterizer`], [`NotebookOutputReader`]
//!   and [`HtmlConverter`]
//! - Executors: [`ProcessDocumentExecutor`] and [`PassthroughExecutor`]

pub mod converter;
pub mod handoff;
pub mod lifecycle;
pub mod output;
pub mod parameterizer;
pub mod process;

pub use converter::HtmlConverter;
pub use handoff::{ExecutionWorker, JobQueue, QueueHandoff};
pub use lifecycle::{LifecycleConfig, LifecycleEngine, LifecycleEngineBuilder, RecoveryReport};
pub use output::{output_display_data, NotebookOutputReader, OUTPUT_MIME_TYPE};
pub use parameterizer::{NotebookParameterizer, INJECTED_PARAMETERS_TAG, PARAMETERS_TAG};
pub use process::{PassthroughExecutor, ProcessDocumentExecutor, ProcessExecutorConfig};

#[cfg(test)]
mod test_support;
