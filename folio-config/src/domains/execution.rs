//! Execution configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle engine and worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on one document execution
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_execution_timeout"
    )]
    pub execution_timeout: Duration,

    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Jobs that may wait in the handoff queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// `Retry-After` returned while a job is still running
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_status_retry_after"
    )]
    pub status_retry_after: Duration,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Which executor runs documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Returns documents unchanged
    #[default]
    Passthrough,
    /// Pipes documents through an external program
    Process,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub kind: ExecutorKind,

    /// Program for the `process` executor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    pub args: Vec<String>,

    /// Language assumed for documents that declare none
    #[serde(default = "default_kernel_language")]
    pub kernel_language: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::default(),
            program: None,
            args: Vec::new(),
            kernel_language: default_kernel_language(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            execution_timeout: default_execution_timeout(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            queue_capacity: default_queue_capacity(),
            status_retry_after: default_status_retry_after(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.execution_timeout.as_secs(),
            "execution_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.max_concurrent_jobs,
            "max_concurrent_jobs",
            self.domain_name(),
        )?;
        validate_positive(self.queue_capacity, "queue_capacity", self.domain_name())?;
        self.executor.validate()
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

impl Validatable for ExecutorConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.kind == ExecutorKind::Process
            && self.program.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return Err(self.validation_error("the process executor requires a program"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution.executor"
    }
}

fn default_execution_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_status_retry_after() -> Duration {
    Duration::from_secs(1)
}

fn default_kernel_language() -> String {
    "python".to_string()
}
