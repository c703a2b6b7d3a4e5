//! Execution job domain model

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::{FolioError, FolioResult};
use chrono::{DateTime, Utc};
use folio_schema::{NamedType, ValidationOutcome};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a new random job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle status of a job
///
/// Transitions are monotonic: `Accepted -> Executing -> {Completed, InternalError}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Accepted,
    Executing,
    Completed,
    InternalError,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Accepted,
        JobStatus::Executing,
        JobStatus::Completed,
        JobStatus::InternalError,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::InternalError)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Accepted, JobStatus::Executing)
                | (JobStatus::Executing, JobStatus::Completed)
                | (JobStatus::Executing, JobStatus::InternalError)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Accepted => "ACCEPTED",
            JobStatus::Executing => "EXECUTING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPTED" => Ok(JobStatus::Accepted),
            "EXECUTING" => Ok(JobStatus::Executing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "INTERNAL_ERROR" => Ok(JobStatus::InternalError),
            other => Err(FolioError::Internal(format!("Unknown job status: {}", other))),
        }
    }
}

/// Whether the document itself ran cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    Succeeded,
    Failed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Succeeded => "SUCCEEDED",
            CompletionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a finished execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDetails {
    pub completion_status: CompletionStatus,
    pub end_time: DateTime<Utc>,
    #[serde(with = "folio_schema::named")]
    #[schemars(with = "Artifact")]
    pub document: Artifact,
    #[serde(with = "folio_schema::named")]
    #[schemars(with = "Artifact")]
    pub html: Artifact,
    #[serde(with = "folio_schema::named")]
    #[schemars(with = "Artifact")]
    pub report: Artifact,
    #[serde(
        default,
        with = "folio_schema::named::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Artifact>")]
    pub output: Option<Artifact>,
    #[serde(
        default,
        with = "folio_schema::named::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Artifact>")]
    pub exception: Option<Artifact>,
    /// Informational validation of the output against the output schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_validation: Option<ValidationOutcome>,
}

impl CompletionDetails {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        match kind {
            ArtifactKind::Document => Some(&self.document),
            ArtifactKind::Html => Some(&self.html),
            ArtifactKind::Report => Some(&self.report),
            ArtifactKind::Output => self.output.as_ref(),
            ArtifactKind::Exception => self.exception.as_ref(),
        }
    }

    /// Artifacts that are present, in [`ArtifactKind::ALL`] order
    pub fn artifacts(&self) -> Vec<(ArtifactKind, &Artifact)> {
        ArtifactKind::ALL
            .iter()
            .filter_map(|kind| self.artifact(*kind).map(|artifact| (*kind, artifact)))
            .collect()
    }
}

impl NamedType for CompletionDetails {
    const NAMESPACE: &'static str = "folio.CompletionDetails";
}

/// An execution job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub job_type_id: String,
    pub parameters: Map<String, JsonValue>,
    pub status: JobStatus,
    pub accepted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "folio_schema::named::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<CompletionDetails>")]
    pub completion_details: Option<CompletionDetails>,
}

impl NamedType for Job {
    const NAMESPACE: &'static str = "folio.Job";
}

impl Job {
    /// Create a new job in the `Accepted` status
    pub fn accept(job_type_id: impl Into<String>, parameters: Map<String, JsonValue>) -> Self {
        Self {
            job_id: JobId::new(),
            job_type_id: job_type_id.into(),
            parameters,
            status: JobStatus::Accepted,
            accepted_at: Utc::now(),
            started_at: None,
            completion_details: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fail with `InvalidExecutionState` unless the status is one of `expected`
    pub fn ensure_status(&self, expected: &[JobStatus]) -> FolioResult<()> {
        if expected.contains(&self.status) {
            Ok(())
        } else {
            Err(FolioError::invalid_state(&self.job_id, self.status, expected))
        }
    }

    /// Move an accepted job into `Executing`
    pub fn start_executing(&mut self) -> FolioResult<()> {
        self.transition(JobStatus::Executing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record a finished execution
    pub fn complete(&mut self, details: CompletionDetails) -> FolioResult<()> {
        self.transition(JobStatus::Completed)?;
        self.completion_details = Some(details);
        Ok(())
    }

    /// Record an infrastructure failure; no completion details are kept
    pub fn mark_internal_error(&mut self) -> FolioResult<()> {
        self.transition(JobStatus::InternalError)?;
        self.completion_details = None;
        Ok(())
    }

    pub fn completion_status(&self) -> Option<CompletionStatus> {
        self.completion_details
            .as_ref()
            .map(|details| details.completion_status)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.completion_details.as_ref().map(|details| details.end_time)
    }

    /// Artifact of `kind`, available only once the job is terminal
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        if !self.is_terminal() {
            return None;
        }
        self.completion_details
            .as_ref()
            .and_then(|details| details.artifact(kind))
    }

    /// Reject with the statuses `next` may be entered from
    fn transition(&mut self, next: JobStatus) -> FolioResult<()> {
        if !self.status.can_transition_to(next) {
            let sources: Vec<JobStatus> = JobStatus::ALL
                .into_iter()
                .filter(|status| status.can_transition_to(next))
                .collect();
            return Err(FolioError::invalid_state(&self.job_id, self.status, &sources));
        }
        self.status = next;
        Ok(())
    }
}
