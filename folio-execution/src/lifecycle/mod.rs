//! Execution lifecycle engine
//!
//! A job moves through `Accepted -> Executing -> {Completed, InternalError}`
//! across three operations:
//!
//! - [`LifecycleEngine::accept`] validates parameters and records the job
//! - [`LifecycleEngine::begin`] hands an accepted job to the task handoff
//! - [`LifecycleEngine::complete`] runs the document and records the outcome
//!
//! Once `complete` has checkpointed the job as `Executing`, every failure is
//! recorded on the job instead of being returned, and the final record is
//! always persisted.

use crate::converter::HtmlConverter;
use crate::output::NotebookOutputReader;
use crate::parameterizer::NotebookParameterizer;
use chrono::Utc;
use folio_core::{
    artifact_path, Artifact, ArtifactKind, CompletionDetails, CompletionStatus, Document,
    FolioError, FolioResult, Job, JobId, JobStatus, JobTypeConfig,
};
use folio_interfaces::{
    ArtifactStore, DocumentConverter, DocumentExecutor, DocumentParameterizer, ExecutionReport,
    JobRepository, JobTypeRepository, OutputReader, TaskHandoff,
};
use folio_schema::{SchemaBinder, ValidationOutcome};
use futures_util::future::try_join_all;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};


/// Engine settings
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Upper bound on a single document execution
    pub execution_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(600),
        }
    }
}

/// Outcome of [`LifecycleEngine::recover`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Accepted jobs handed off again
    pub resubmitted: Vec<JobId>,
    /// Jobs found in `Executing`, left as they are
    pub stuck: Vec<JobId>,
}

/// Drives execution jobs through their lifecycle
pub struct LifecycleEngine {
    jobs: Arc<dyn JobRepository>,
    job_types: Arc<dyn JobTypeRepository>,
    artifacts: Arc<dyn ArtifactStore>,
    binder: Arc<SchemaBinder>,
    executor: Arc<dyn DocumentExecutor>,
    parameterizer: Arc<dyn DocumentParameterizer>,
    converter: Arc<dyn DocumentConverter>,
    output_reader: Arc<dyn OutputReader>,
    handoff: Arc<dyn TaskHandoff>,
    config: LifecycleConfig,
}

impl LifecycleEngine {
    pub fn builder() -> LifecycleEngineBuilder {
        LifecycleEngineBuilder::default()
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Validate `parameters` and record a new `Accepted` job
    ///
    /// Parameters are checked against the job type's resolved input schema;
    /// on mismatch nothing is persisted.
    pub async fn accept(&self, job_type_id: &str, parameters: JsonValue) -> FolioResult<Job> {
        let job_type = self.job_types.get(job_type_id).await?;

        let outcome = self
            .binder
            .validate(&parameters, &job_type.resolved_input_schema)?;
        if !outcome.is_valid {
            return Err(FolioError::InvalidInputSchema {
                schema_error: outcome.error.unwrap_or_default(),
            });
        }
        let JsonValue::Object(parameters) = parameters else {
            return Err(FolioError::InvalidInputSchema {
                schema_error: "parameters must be a JSON object".to_string(),
            });
        };

        let job = Job::accept(job_type.id.clone(), parameters);
        self.jobs.create(&job).await?;

        info!(job_id = %job.job_id, job_type_id = %job.job_type_id, "Accepted job");
        Ok(job)
    }

    /// Hand an accepted job off for completion
    pub async fn begin(&self, job: &Job) -> FolioResult<()> {
        job.ensure_status(&[JobStatus::Accepted])?;
        self.handoff.submit(&job.job_id).await?;
        debug!(job_id = %job.job_id, "Submitted job for execution");
        Ok(())
    }

    /// Execute an accepted job and record its outcome
    ///
    /// Fails only before the `Executing` checkpoint: unknown job, a job that
    /// is not `Accepted`, or a lost race with a concurrent `complete`. After
    /// the checkpoint the job always ends `Completed` or `InternalError`,
    /// and the returned job is the persisted final record.
    pub async fn complete(&self, job_id: &JobId) -> FolioResult<Job> {
        let mut job = self.jobs.get(job_id).await?;
        // The expected list names the status `complete` moves the job into
        if job.status != JobStatus::Accepted {
            return Err(FolioError::invalid_state(
                &job.job_id,
                job.status,
                &[JobStatus::Executing],
            ));
        }
        job.start_executing()?;
        self.jobs
            .save_if_status(&job, JobStatus::Accepted)
            .await
            .map_err(|e| match e {
                FolioError::ConcurrentModification { job_id, actual, .. } => {
                    FolioError::invalid_state(&job_id, actual, &[JobStatus::Executing])
                }
                other => other,
            })?;
        info!(job_id = %job.job_id, job_type_id = %job.job_type_id, "Executing job");

        match self.execute(&job).await {
            Ok(details) => {
                let completion_status = details.completion_status;
                job.complete(details)?;
                info!(
                    job_id = %job.job_id,
                    completion_status = %completion_status,
                    "Job completed"
                );
            }
            Err(e) => {
                error!(job_id = %job.job_id, error = %e, "Job failed with an internal error");
                job.mark_internal_error()?;
            }
        }

        self.jobs.save_if_status(&job, JobStatus::Executing).await?;
        Ok(job)
    }

    pub async fn get_job(&self, job_id: &JobId) -> FolioResult<Job> {
        self.jobs.get(job_id).await
    }

    /// Reference and content of one artifact of a terminal job
    pub async fn get_artifact(
        &self,
        job_id: &JobId,
        kind: ArtifactKind,
    ) -> FolioResult<(Artifact, String)> {
        let job = self.jobs.get(job_id).await?;
        let artifact = job
            .artifact(kind)
            .cloned()
            .ok_or_else(|| FolioError::ArtifactNotFound {
                job_id: job_id.clone(),
                artifact: kind.to_string(),
            })?;
        let content = self.artifacts.get_content(&artifact).await?;
        Ok((artifact, content))
    }

    /// Hand off again every job still `Accepted`
    ///
    /// Jobs left in `Executing` by a previous process are reported but not
    /// resumed.
    pub async fn recover(&self) -> FolioResult<RecoveryReport> {
        let mut report = RecoveryReport::default();

        for job in self.jobs.list_by_status(JobStatus::Accepted).await? {
            self.begin(&job).await?;
            report.resubmitted.push(job.job_id);
        }
        for job in self.jobs.list_by_status(JobStatus::Executing).await? {
            warn!(job_id = %job.job_id, "Job was interrupted while executing and will not be resumed");
            report.stuck.push(job.job_id);
        }

        if !report.resubmitted.is_empty() {
            info!(count = report.resubmitted.len(), "Resubmitted accepted jobs");
        }
        Ok(report)
    }

    async fn execute(&self, job: &Job) -> FolioResult<CompletionDetails> {
        let job_type = self.job_types.get(&job.job_type_id).await?;

        let bound = self.binder.bind(
            &job_type.input_schema,
            JsonValue::Object(job.parameters.clone()),
        )?;
        let template = self.job_types.load_document(&job_type).await?;
        let document = self
            .parameterizer
            .parameterize(template, &bound, &job.parameters)?;

        let report = self.run_executor(document).await?;
        let end_time = Utc::now();
        let completion_status = match report.exception {
            Some(_) => CompletionStatus::Failed,
            None => CompletionStatus::Succeeded,
        };

        let output = self.output_reader.read_output(&report.document)?;
        let output_validation = output
            .as_deref()
            .map(|raw| self.validate_output(job, &job_type, raw));

        let new_artifact =
            |kind: ArtifactKind| self.artifacts.new_artifact(&artifact_path(&job.job_id, kind));
        let document_artifact = new_artifact(ArtifactKind::Document);
        let html_artifact = new_artifact(ArtifactKind::Html);
        let report_artifact = new_artifact(ArtifactKind::Report);

        let mut writes = vec![
            (
                document_artifact.clone(),
                self.converter.to_raw(&report.document)?,
            ),
            (
                html_artifact.clone(),
                self.converter.to_html(&report.document, false)?,
            ),
            (
                report_artifact.clone(),
                self.converter.to_html(&report.document, true)?,
            ),
        ];
        let output_artifact = output.map(|content| {
            let artifact = new_artifact(ArtifactKind::Output);
            writes.push((artifact.clone(), content));
            artifact
        });
        let exception_artifact = report.exception.map(|message| {
            let artifact = new_artifact(ArtifactKind::Exception);
            writes.push((artifact.clone(), message));
            artifact
        });

        try_join_all(writes.into_iter().map(|(artifact, content)| async move {
            self.artifacts.set_content(&artifact, content).await
        }))
        .await?;

        Ok(CompletionDetails {
            completion_status,
            end_time,
            document: document_artifact,
            html: html_artifact,
            report: report_artifact,
            output: output_artifact,
            exception: exception_artifact,
            output_validation,
        })
    }

    /// Run the executor in its own task, bounded by the execution timeout
    ///
    /// A timeout is a failure of the document; a panic or an executor error
    /// is an internal error.
    async fn run_executor(&self, document: Document) -> FolioResult<ExecutionReport> {
        let timeout = self.config.execution_timeout;
        let fallback = document.clone();
        let executor = self.executor.clone();
        let mut handle = tokio::spawn(async move { executor.execute(document).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(FolioError::Execution(format!(
                "Executor task failed: {}",
                join_error
            ))),
            Err(_) => {
                handle.abort();
                Ok(ExecutionReport::failed(
                    fallback,
                    format!("Execution timed out after {}s", timeout.as_secs()),
                ))
            }
        }
    }

    fn validate_output(&self, job: &Job, job_type: &JobTypeConfig, raw: &str) -> ValidationOutcome {
        let outcome = match serde_json::from_str::<JsonValue>(raw) {
            Ok(output) => self
                .binder
                .validate(&output, &job_type.resolved_output_schema)
                .unwrap_or_else(|e| ValidationOutcome::invalid(e.to_string())),
            Err(e) => ValidationOutcome::invalid(format!("Output is not valid JSON: {}", e)),
        };
        if let Some(error) = &outcome.error {
            warn!(job_id = %job.job_id, error = %error, "Output does not match the output schema");
        }
        outcome
    }
}

/// Builder for [`LifecycleEngine`]
///
/// Repositories, artifact store, binder, executor and handoff are required.
/// The notebook parameterizer, output reader and HTML converter are used
/// unless replaced.
#[derive(Default)]
pub struct LifecycleEngineBuilder {
    jobs: Option<Arc<dyn JobRepository>>,
    job_types: Option<Arc<dyn JobTypeRepository>>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
    binder: Option<Arc<SchemaBinder>>,
    executor: Option<Arc<dyn DocumentExecutor>>,
    parameterizer: Option<Arc<dyn DocumentParameterizer>>,
    converter: Option<Arc<dyn DocumentConverter>>,
    output_reader: Option<Arc<dyn OutputReader>>,
    handoff: Option<Arc<dyn TaskHandoff>>,
    config: LifecycleConfig,
}

impl LifecycleEngineBuilder {
    pub fn with_job_repository(mut self, jobs: Arc<dyn JobRepository>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn with_job_type_repository(mut self, job_types: Arc<dyn JobTypeRepository>) -> Self {
        self.job_types = Some(job_types);
        self
    }

    pub fn with_artifact_store(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_binder(mut self, binder: Arc<SchemaBinder>) -> Self {
        self.binder = Some(binder);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn DocumentExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_parameterizer(mut self, parameterizer: Arc<dyn DocumentParameterizer>) -> Self {
        self.parameterizer = Some(parameterizer);
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_output_reader(mut self, output_reader: Arc<dyn OutputReader>) -> Self {
        self.output_reader = Some(output_reader);
        self
    }

    pub fn with_handoff(mut self, handoff: Arc<dyn TaskHandoff>) -> Self {
        self.handoff = Some(handoff);
        self
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> FolioResult<LifecycleEngine> {
        Ok(LifecycleEngine {
            jobs: required(self.jobs, "job repository")?,
            job_types: required(self.job_types, "job type repository")?,
            artifacts: required(self.artifacts, "artifact store")?,
            binder: required(self.binder, "schema binder")?,
            executor: required(self.executor, "document executor")?,
            handoff: required(self.handoff, "task handoff")?,
            parameterizer: self
                .parameterizer
                .unwrap_or_else(|| Arc::new(NotebookParameterizer::new())),
            converter: self
                .converter
                .unwrap_or_else(|| Arc::new(HtmlConverter::new())),
            output_reader: self
                .output_reader
                .unwrap_or_else(|| Arc::new(NotebookOutputReader::new())),
            config: self.config,
        })
    }
}

fn required<T: ?Sized>(value: Option<Arc<T>>, name: &str) -> FolioResult<Arc<T>> {
    value.ok_or_else(|| FolioError::Configuration(format!("Lifecycle engine requires a {}", name)))
}
