//! Document executors
//!
//! [`ProcessDocumentExecutor`] delegates to an external program speaking a
//! small stdio protocol: the parameterized document is written to stdin as
//! JSON and the executed document is read back from stdout.
//!
//! - exit status 0: the document ran successfully
//! - non-zero with a document on stdout: the document's code failed, and
//!   stderr describes the failure
//! - anything else: the executor itself failed

use async_trait::async_trait;
use folio_core::{Document, FolioError, FolioResult};
use folio_interfaces::{DocumentExecutor, ExecutionReport};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// External program invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessExecutorConfig {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessExecutorConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Runs each document in a fresh child process
#[derive(Debug, Clone)]
pub struct ProcessDocumentExecutor {
    config: ProcessExecutorConfig,
}

impl ProcessDocumentExecutor {
    pub fn new(config: ProcessExecutorConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl DocumentExecutor for ProcessDocumentExecutor {
    async fn execute(&self, document: Document) -> FolioResult<ExecutionReport> {
        let input = serde_json::to_vec(&document)?;

        let mut child = self.command().spawn().map_err(|e| {
            FolioError::Execution(format!("Failed to start '{}': {}", self.config.program, e))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FolioError::Execution("Executor stdin is not available".to_string()))?;
        debug!(program = %self.config.program, pid = ?child.id(), "Started executor process");

        // The program may exit without reading all of its input
        let write_input = async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            match result {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (written, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output?;
        written?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let executed = serde_json::from_slice::<Document>(&output.stdout);

        match (output.status.success(), executed) {
            (true, Ok(executed)) => Ok(ExecutionReport::succeeded(executed)),
            (false, Ok(executed)) => {
                let exception = if stderr.is_empty() {
                    format!("Execution failed with {}", output.status)
                } else {
                    stderr
                };
                Ok(ExecutionReport::failed(executed, exception))
            }
            (_, Err(e)) => {
                warn!(status = %output.status, stderr = %stderr, "Executor returned no document");
                Err(FolioError::Execution(format!(
                    "Executor exited with {} without a readable document: {}",
                    output.status, e
                )))
            }
        }
    }
}

/// Returns every document unchanged, as if it had run without output
#[derive(Debug, Clone, Default)]
pub struct PassthroughExecutor;

impl PassthroughExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExecutor for PassthroughExecutor {
    async fn execute(&self, document: Document) -> FolioResult<ExecutionReport> {
        Ok(ExecutionReport::succeeded(document))
    }
}
