//! Request and response bodies

use chrono::{DateTime, Utc};
use folio_core::{CompletionStatus, Job, JobId, JobStatus, JobTypeConfig};
use folio_schema::ValidationOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub parameters: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub job_type_id: String,
}

impl From<&Job> for ExecuteResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            job_type_id: job.job_type_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Job record as shown to API clients
///
/// `artifacts` maps each artifact kind the job produced to its URL and is
/// absent until the job is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub job_id: JobId,
    pub job_type_id: String,
    pub status: JobStatus,
    pub parameters: Map<String, JsonValue>,
    pub accepted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<CompletionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_validation: Option<ValidationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<BTreeMap<String, String>>,
}

impl JobResponse {
    pub fn new(job: Job, artifact_url: impl Fn(&str) -> String) -> Self {
        let artifacts = job.completion_details.as_ref().map(|details| {
            details
                .artifacts()
                .into_iter()
                .map(|(kind, _)| (kind.to_string(), artifact_url(kind.as_str())))
                .collect()
        });

        Self {
            completion_status: job.completion_status(),
            ended_at: job.ended_at(),
            output_validation: job
                .completion_details
                .as_ref()
                .and_then(|details| details.output_validation.clone()),
            artifacts,
            job_id: job.job_id,
            job_type_id: job.job_type_id,
            status: job.status,
            parameters: job.parameters,
            accepted_at: job.accepted_at,
            started_at: job.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeListResponse {
    pub job_types: Vec<String>,
}

/// A job type with its self-contained schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeResponse {
    pub id: String,
    pub input_schema: JsonValue,
    pub output_schema: JsonValue,
}

impl From<&JobTypeConfig> for JobTypeResponse {
    fn from(job_type: &JobTypeConfig) -> Self {
        Self {
            id: job_type.id.clone(),
            input_schema: job_type.resolved_input_schema.clone(),
            output_schema: job_type.resolved_output_schema.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Artifact, CompletionDetails};
    use serde_json::json;

    fn artifact(path: &str) -> Artifact {
        Artifact::new("in_memory", path)
    }

    #[test]
    fn test_pending_job_has_no_artifacts() {
        let job = Job::accept("echo", Map::new());
        let value = serde_json::to_value(JobResponse::new(job, |kind| kind.to_string())).unwrap();
        assert_eq!(value["status"], "ACCEPTED");
        assert!(value.get("artifacts").is_none());
        assert!(value.get("completionStatus").is_none());
    }

    #[test]
    fn test_completed_job_links_its_artifacts() {
        let mut job = Job::accept("echo", Map::new());
        job.start_executing().unwrap();
        job.complete(CompletionDetails {
            completion_status: CompletionStatus::Failed,
            end_time: Utc::now(),
            document: artifact("a.ipynb"),
            html: artifact("a.html"),
            report: artifact("a.report.html"),
            output: None,
            exception: Some(artifact("a.exception.txt")),
            output_validation: None,
        })
        .unwrap();

        let value =
            serde_json::to_value(JobResponse::new(job, |kind| format!("/a/{kind}"))).unwrap();
        assert_eq!(value["completionStatus"], "FAILED");
        assert_eq!(
            value["artifacts"],
            json!({
                "ipynb": "/a/ipynb",
                "html": "/a/html",
                "html_report": "/a/html_report",
                "exception": "/a/exception"
            })
        );
    }
}
