//! In-memory job repository

use super::JobCodec;
use async_trait::async_trait;
use folio_core::{FolioError, FolioResult, Job, JobId, JobStatus};
use folio_interfaces::JobRepository;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Job repository backed by a map of encoded records
///
/// Records are stored in the same encoded form the durable backends use, so
/// everything handed out is a fresh decoded copy.
pub struct InMemoryJobRepository {
    codec: JobCodec,
    records: RwLock<HashMap<JobId, String>>,
}

impl InMemoryJobRepository {
    pub fn new(codec: JobCodec) -> Self {
        Self {
            codec,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get(&self, job_id: &JobId) -> FolioResult<Job> {
        let records = self.records.read().await;
        let raw = records
            .get(job_id)
            .ok_or_else(|| FolioError::JobNotFound(job_id.clone()))?;
        self.codec.decode(raw)
    }

    async fn create(&self, job: &Job) -> FolioResult<()> {
        let encoded = self.codec.encode(job)?;
        let mut records = self.records.write().await;
        if records.contains_key(&job.job_id) {
            return Err(FolioError::DuplicateJob(job.job_id.clone()));
        }
        records.insert(job.job_id.clone(), encoded);
        debug!(job_id = %job.job_id, "Created job record");
        Ok(())
    }

    async fn save(&self, job: &Job) -> FolioResult<()> {
        let encoded = self.codec.encode(job)?;
        self.records.write().await.insert(job.job_id.clone(), encoded);
        Ok(())
    }

    async fn save_if_status(&self, job: &Job, expected: JobStatus) -> FolioResult<()> {
        let encoded = self.codec.encode(job)?;
        let mut records = self.records.write().await;
        let current = records
            .get(&job.job_id)
            .ok_or_else(|| FolioError::JobNotFound(job.job_id.clone()))?;
        let actual = self.codec.decode(current)?.status;
        if actual != expected {
            return Err(FolioError::ConcurrentModification {
                job_id: job.job_id.clone(),
                expected,
                actual,
            });
        }
        records.insert(job.job_id.clone(), encoded);
        Ok(())
    }

    async fn list_by_status(&self, status: JobStatus) -> FolioResult<Vec<Job>> {
        let records = self.records.read().await;
        let mut jobs = Vec::new();
        for raw in records.values() {
            let job = self.codec.decode(raw)?;
            if job.status == status {
                jobs.push(job);
            }
        }
        jobs.sort_by_key(|job| job.accepted_at);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::{codec, parameters};

    #[tokio::test]
    async fn test_create_and_get() {
        let repository = InMemoryJobRepository::new(codec());
        let job = Job::accept("echo", parameters());

        repository.create(&job).await.unwrap();
        let stored = repository.get(&job.job_id).await.unwrap();
        assert_eq!(stored, job);
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_job() {
        let repository = InMemoryJobRepository::new(codec());
        let result = repository.get(&JobId::from("missing")).await;
        assert!(matches!(result, Err(FolioError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let repository = InMemoryJobRepository::new(codec());
        let job = Job::accept("echo", parameters());
        repository.create(&job).await.unwrap();

        let result = repository.create(&job).await;
        assert!(matches!(result, Err(FolioError::DuplicateJob(_))));
    }

    #[tokio::test]
    async fn test_save_if_status_is_compare_and_set() {
        let repository = InMemoryJobRepository::new(codec());
        let job = Job::accept("echo", parameters());
        repository.create(&job).await.unwrap();

        let mut first = job.clone();
        first.start_executing().unwrap();
        repository
            .save_if_status(&first, JobStatus::Accepted)
            .await
            .unwrap();

        // A second writer that loaded the job before the first update loses
        let mut second = job.clone();
        second.start_executing().unwrap();
        let result = repository.save_if_status(&second, JobStatus::Accepted).await;
        match result {
            Err(FolioError::ConcurrentModification { expected, actual, .. }) => {
                assert_eq!(expected, JobStatus::Accepted);
                assert_eq!(actual, JobStatus::Executing);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(first, repository.get(&job.job_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let repository = InMemoryJobRepository::new(codec());
        let accepted = Job::accept("echo", parameters());
        let mut executing = Job::accept("echo", parameters());
        executing.start_executing().unwrap();

        repository.create(&accepted).await.unwrap();
        repository.create(&executing).await.unwrap();

        let jobs = repository.list_by_status(JobStatus::Accepted).await.unwrap();
        assert_eq!(jobs, vec![accepted]);
        assert!(repository
            .list_by_status(JobStatus::Completed)
            .await
            .unwrap()
            .is_empty());
    }
}
