//! Core error types for Folio

use crate::job::{JobId, JobStatus};
use folio_schema::SchemaError;
use thiserror::Error;

/// Core error type for all Folio errors
#[derive(Debug, Error)]
pub enum FolioError {
    /// Parameters failed validation against the job type's input schema
    #[error("The input parameters do not match the schema for the job type. Details: {schema_error}")]
    InvalidInputSchema { schema_error: String },

    /// The job is not in a status that allows the requested operation
    #[error(
        "The job is not in a valid state to perform this action. Current status: {current_status}. Expected status: {}",
        format_statuses(.expected_status)
    )]
    InvalidExecutionState {
        job_id: JobId,
        current_status: JobStatus,
        expected_status: Vec<JobStatus>,
    },

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job type not found: {0}")]
    JobTypeNotFound(String),

    #[error("Artifact '{artifact}' not found for job {job_id}")]
    ArtifactNotFound { job_id: JobId, artifact: String },

    #[error("Stored content not found: {0}")]
    StoredContentNotFound(String),

    #[error("Unrecognized artifact scheme: {0}")]
    UnrecognizedScheme(String),

    #[error("Job already exists: {0}")]
    DuplicateJob(JobId),

    /// A compare-and-set update found a different stored status
    #[error("Job {job_id} was modified concurrently: expected status {expected}, found {actual}")]
    ConcurrentModification {
        job_id: JobId,
        expected: JobStatus,
        actual: JobStatus,
    },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

/// Result type alias for Folio
pub type FolioResult<T> = std::result::Result<T, FolioError>;

fn format_statuses(statuses: &[JobStatus]) -> String {
    let names: Vec<&str> = statuses.iter().map(JobStatus::as_str).collect();
    format!("[{}]", names.join(", "))
}

impl FolioError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            FolioError::InvalidInputSchema { .. } => "INVALID_INPUT_SCHEMA",
            FolioError::InvalidExecutionState { .. } => "INVALID_EXECUTION_STATE",
            FolioError::JobNotFound(_) => "JOB_NOT_FOUND",
            FolioError::JobTypeNotFound(_) => "JOB_TYPE_NOT_FOUND",
            FolioError::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            FolioError::StoredContentNotFound(_) => "STORED_CONTENT_NOT_FOUND",
            FolioError::UnrecognizedScheme(_) => "UNRECOGNIZED_SCHEME",
            _ => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the error maps to at the API boundary
    pub fn status_code(&self) -> u16 {
        match self {
            FolioError::InvalidInputSchema { .. } | FolioError::InvalidExecutionState { .. } => 400,
            FolioError::JobNotFound(_)
            | FolioError::JobTypeNotFound(_)
            | FolioError::ArtifactNotFound { .. }
            | FolioError::StoredContentNotFound(_) => 404,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    pub fn invalid_state(job_id: &JobId, current: JobStatus, expected: &[JobStatus]) -> Self {
        FolioError::InvalidExecutionState {
            job_id: job_id.clone(),
            current_status: current,
            expected_status: expected.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let error = FolioError::invalid_state(
            &JobId::from("abc"),
            JobStatus::Completed,
            &[JobStatus::Executing],
        );
        assert_eq!(
            error.to_string(),
            "The job is not in a valid state to perform this action. Current status: COMPLETED. Expected status: [EXECUTING]"
        );
        assert_eq!(error.error_code(), "INVALID_EXECUTION_STATE");
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn test_status_mapping() {
        let input = FolioError::InvalidInputSchema {
            schema_error: "missing x".to_string(),
        };
        assert_eq!(input.status_code(), 400);
        assert_eq!(input.error_code(), "INVALID_INPUT_SCHEMA");

        assert_eq!(FolioError::JobNotFound(JobId::from("j")).status_code(), 404);
        assert_eq!(FolioError::JobTypeNotFound("t".into()).status_code(), 404);
        assert_eq!(
            FolioError::ArtifactNotFound {
                job_id: JobId::from("j"),
                artifact: "html".into()
            }
            .status_code(),
            404
        );
        assert_eq!(FolioError::StoredContentNotFound("p".into()).status_code(), 404);

        let internal = FolioError::Storage("disk full".to_string());
        assert_eq!(internal.status_code(), 500);
        assert_eq!(internal.error_code(), "INTERNAL_ERROR");
        assert_eq!(FolioError::UnrecognizedScheme("s3".into()).status_code(), 500);
    }

    #[test]
    fn test_schema_error_conversion() {
        let error: FolioError = SchemaError::KeyNotFound("x".to_string()).into();
        assert!(matches!(error, FolioError::Schema(_)));
        assert_eq!(error.status_code(), 500);
    }
}
