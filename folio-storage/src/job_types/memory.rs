//! In-memory job type repository

use async_trait::async_trait;
use folio_core::{Document, FolioError, FolioResult, JobTypeConfig, JobTypeDescriptor};
use folio_interfaces::JobTypeRepository;
use folio_schema::SchemaBinder;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Entry {
    config: Arc<JobTypeConfig>,
    document: Document,
}

/// Job types registered programmatically, with their documents held in memory
pub struct InMemoryJobTypeRepository {
    binder: Arc<SchemaBinder>,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl InMemoryJobTypeRepository {
    pub fn new(binder: Arc<SchemaBinder>) -> Self {
        Self {
            binder,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add or replace a job type; its schemas are resolved immediately
    pub async fn insert(
        &self,
        id: impl Into<String>,
        descriptor: JobTypeDescriptor,
        document: Document,
    ) -> FolioResult<Arc<JobTypeConfig>> {
        let id = id.into();
        let document_path = format!("{}.ipynb", id);
        let config = Arc::new(JobTypeConfig::resolve(
            id.clone(),
            document_path,
            descriptor,
            &self.binder,
        )?);
        self.entries.write().await.insert(
            id,
            Entry {
                config: config.clone(),
                document,
            },
        );
        Ok(config)
    }
}

#[async_trait]
impl JobTypeRepository for InMemoryJobTypeRepository {
    async fn get(&self, job_type_id: &str) -> FolioResult<Arc<JobTypeConfig>> {
        self.entries
            .read()
            .await
            .get(job_type_id)
            .map(|entry| entry.config.clone())
            .ok_or_else(|| FolioError::JobTypeNotFound(job_type_id.to_string()))
    }

    async fn list_ids(&self) -> FolioResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn load_document(&self, job_type: &JobTypeConfig) -> FolioResult<Document> {
        self.entries
            .read()
            .await
            .get(&job_type.id)
            .map(|entry| entry.document.clone())
            .ok_or_else(|| FolioError::JobTypeNotFound(job_type.id.clone()))
    }
}
