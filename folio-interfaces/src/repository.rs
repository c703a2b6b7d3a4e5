//! Repository interfaces

use async_trait::async_trait;
use folio_core::{Document, FolioResult, Job, JobId, JobStatus, JobTypeConfig};
use std::sync::Arc;

/// Durable store of job records
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fails with `JobNotFound` for an unknown id
    async fn get(&self, job_id: &JobId) -> FolioResult<Job>;

    /// Fails with `DuplicateJob` if the id is taken
    async fn create(&self, job: &Job) -> FolioResult<()>;

    /// Overwrite the stored record
    async fn save(&self, job: &Job) -> FolioResult<()>;

    /// Overwrite the stored record only if its status is still `expected`
    ///
    /// Fails with `ConcurrentModification` otherwise, leaving the stored
    /// record untouched.
    async fn save_if_status(&self, job: &Job, expected: JobStatus) -> FolioResult<()>;

    async fn list_by_status(&self, status: JobStatus) -> FolioResult<Vec<Job>>;
}

/// Lookup of job types and their documents
#[async_trait]
pub trait JobTypeRepository: Send + Sync {
    /// Fails with `JobTypeNotFound` for an unknown id
    async fn get(&self, job_type_id: &str) -> FolioResult<Arc<JobTypeConfig>>;

    /// Known job type ids in sorted order
    async fn list_ids(&self) -> FolioResult<Vec<String>>;

    /// Load a fresh copy of the job type's document template
    async fn load_document(&self, job_type: &JobTypeConfig) -> FolioResult<Document>;
}
