//! Filesystem-backed job repository
//!
//! One `<job id>.json` file per job. Writes go to a temporary file that is
//! then renamed into place, so a record is never observed half-written.

use super::JobCodec;
use async_trait::async_trait;
use folio_core::{FolioError, FolioResult, Job, JobId, JobStatus};
use folio_interfaces::JobRepository;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const RECORD_EXTENSION: &str = "json";

/// Durable job repository rooted at a directory
pub struct FilesystemJobRepository {
    codec: JobCodec,
    directory: PathBuf,
    /// Serializes read-compare-write sequences within this process
    write_lock: Mutex<()>,
}

impl FilesystemJobRepository {
    /// Open a repository, creating the directory if needed
    pub async fn open(directory: impl Into<PathBuf>, codec: JobCodec) -> FolioResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;
        Ok(Self {
            codec,
            directory,
            write_lock: Mutex::new(()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, job_id: &JobId) -> Option<PathBuf> {
        let id = job_id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return None;
        }
        Some(self.directory.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    async fn read(&self, job_id: &JobId) -> FolioResult<Option<Job>> {
        let Some(path) = self.record_path(job_id) else {
            return Ok(None);
        };
        match fs::read_to_string(&path).await {
            Ok(raw) => self.codec.decode(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, job: &Job) -> FolioResult<()> {
        let path = self
            .record_path(&job.job_id)
            .ok_or_else(|| FolioError::Storage(format!("Invalid job id: {}", job.job_id)))?;
        let encoded = self.codec.encode(job)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, encoded).await?;
        fs::rename(&temp_path, &path).await?;
        debug!(job_id = %job.job_id, status = %job.status, "Wrote job record");
        Ok(())
    }
}

#[async_trait]
impl JobRepository for FilesystemJobRepository {
    async fn get(&self, job_id: &JobId) -> FolioResult<Job> {
        self.read(job_id)
            .await?
            .ok_or_else(|| FolioError::JobNotFound(job_id.clone()))
    }

    async fn create(&self, job: &Job) -> FolioResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(&job.job_id).await?.is_some() {
            return Err(FolioError::DuplicateJob(job.job_id.clone()));
        }
        self.write(job).await
    }

    async fn save(&self, job: &Job) -> FolioResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(job).await
    }

    async fn save_if_status(&self, job: &Job, expected: JobStatus) -> FolioResult<()> {
        let _guard = self.write_lock.lock().await;
        let current = self
            .read(&job.job_id)
            .await?
            .ok_or_else(|| FolioError::JobNotFound(job.job_id.clone()))?;
        if current.status != expected {
            return Err(FolioError::ConcurrentModification {
                job_id: job.job_id.clone(),
                expected,
                actual: current.status,
            });
        }
        self.write(job).await
    }

    async fn list_by_status(&self, status: JobStatus) -> FolioResult<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let raw = fs::read_to_string(&path).await?;
            match self.codec.decode(&raw) {
                Ok(job) if job.status == status => jobs.push(job),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable job record"),
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
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let job = Job::accept("echo", parameters());

        {
            let repository = FilesystemJobRepository::open(dir.path(), codec()).await.unwrap();
            repository.create(&job).await.unwrap();
        }

        let repository = FilesystemJobRepository::open(dir.path(), codec()).await.unwrap();
        assert_eq!(repository.get(&job.job_id).await.unwrap(), job);

        let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", job.job_id))).unwrap();
        assert!(raw.contains("\"__ns__\":\"folio.Job\""));
    }

    #[tokio::test]
    async fn test_get_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let repository = FilesystemJobRepository::open(dir.path(), codec()).await.unwrap();

        for id in ["../escape", "a/b", ".hidden", ""] {
            let result = repository.get(&JobId::from(id)).await;
            assert!(matches!(result, Err(FolioError::JobNotFound(_))), "{id}");
        }
    }

    #[tokio::test]
    async fn test_save_if_status_conflict() {
        let dir = TempDir::new().unwrap();
        let repository = FilesystemJobRepository::open(dir.path(), codec()).await.unwrap();
        let mut job = Job::accept("echo", parameters());
        repository.create(&job).await.unwrap();
        assert!(matches!(
            repository.create(&job).await,
            Err(FolioError::DuplicateJob(_))
        ));

        job.start_executing().unwrap();
        repository.save_if_status(&job, JobStatus::Accepted).await.unwrap();

        let result = repository.save_if_status(&job, JobStatus::Accepted).await;
        assert!(matches!(result, Err(FolioError::ConcurrentModification { .. })));
    }

    #[tokio::test]
    async fn test_list_by_status_skips_corrupt_records() {
        let dir = TempDir::new().unwrap();
        let repository = FilesystemJobRepository::open(dir.path(), codec()).await.unwrap();
        let job = Job::accept("echo", parameters());
        repository.create(&job).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let jobs = repository.list_by_status(JobStatus::Accepted).await.unwrap();
        assert_eq!(jobs, vec![job]);
    }
}
