//! Collaborator construction and dependency injection setup

use anyhow::{anyhow, Context, Result};
use folio_config::{ExecutorKind, FolioConfig, StorageBackend, StoreConfig};
use folio_execution::{
    JobQueue, LifecycleConfig, LifecycleEngine, NotebookParameterizer, PassthroughExecutor,
    ProcessDocumentExecutor, ProcessExecutorConfig, QueueHandoff,
};
use folio_interfaces::{ContentStore, DocumentExecutor, JobRepository};
use folio_rest_api::ApiContext;
use folio_schema::{SchemaBinder, TypeRegistry};
use folio_storage::{
    ArtifactClient, FilesystemContentStore, FilesystemJobRepository, FilesystemJobTypeRepository,
    InMemoryContentStore, InMemoryJobRepository, JobCodec, RefreshReport,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Every long-lived service of a running server
pub struct ServiceContainer {
    pub engine: Arc<LifecycleEngine>,
    pub jobs: Arc<dyn JobRepository>,
    pub job_types: Arc<FilesystemJobTypeRepository>,
    /// Job types found at startup
    pub job_type_report: RefreshReport,
    /// Receiving end of the handoff; taken by the execution worker
    pub queue: Option<JobQueue>,
}

impl ServiceContainer {
    pub async fn new(config: &FolioConfig) -> Result<Self> {
        let registry = Arc::new(create_type_registry());
        let binder = Arc::new(SchemaBinder::new(registry.clone()));
        let codec = JobCodec::new(registry);

        let jobs = create_job_repository(&config.storage.jobs, codec).await?;
        let artifacts = Arc::new(ArtifactClient::new(create_content_store(
            &config.storage.artifacts,
        )?));
        let (job_types, job_type_report) =
            load_job_types(&config.job_types.directory, binder.clone()).await?;
        let job_types = Arc::new(job_types);

        let (handoff, queue) = QueueHandoff::channel(config.execution.queue_capacity);
        let parameterizer = NotebookParameterizer::with_default_language(
            config.execution.executor.kernel_language.clone(),
        );

        let engine = LifecycleEngine::builder()
            .with_job_repository(jobs.clone())
            .with_job_type_repository(job_types.clone())
            .with_artifact_store(artifacts)
            .with_binder(binder)
            .with_executor(create_executor(config)?)
            .with_parameterizer(Arc::new(parameterizer))
            .with_handoff(Arc::new(handoff))
            .with_config(LifecycleConfig {
                execution_timeout: config.execution.execution_timeout,
            })
            .build()?;

        Ok(Self {
            engine: Arc::new(engine),
            jobs,
            job_types,
            job_type_report,
            queue: Some(queue),
        })
    }

    pub fn api_context(&self) -> ApiContext {
        ApiContext::new(self.engine.clone(), self.job_types.clone())
    }
}

/// Registry holding every persisted and bindable named type
pub fn create_type_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    folio_core::register_domain_types(&mut registry);
    registry
}

/// Scan a job types directory
pub async fn load_job_types(
    directory: &Path,
    binder: Arc<SchemaBinder>,
) -> Result<(FilesystemJobTypeRepository, RefreshReport)> {
    FilesystemJobTypeRepository::load(directory, binder)
        .await
        .with_context(|| format!("Failed to load job types from {}", directory.display()))
}

async fn create_job_repository(
    store: &StoreConfig,
    codec: JobCodec,
) -> Result<Arc<dyn JobRepository>> {
    match store.backend {
        StorageBackend::Memory => {
            info!("Using in-memory job repository");
            Ok(Arc::new(InMemoryJobRepository::new(codec)))
        }
        StorageBackend::Filesystem => {
            let directory = store_directory(store, "jobs")?;
            info!(directory = %directory.display(), "Using filesystem job repository");
            let repository = FilesystemJobRepository::open(directory, codec)
                .await
                .with_context(|| format!("Failed to open job store {}", directory.display()))?;
            Ok(Arc::new(repository))
        }
    }
}

fn create_content_store(store: &StoreConfig) -> Result<Arc<dyn ContentStore>> {
    match store.backend {
        StorageBackend::Memory => {
            info!("Using in-memory artifact store");
            Ok(Arc::new(InMemoryContentStore::new()))
        }
        StorageBackend::Filesystem => {
            let directory = store_directory(store, "artifacts")?;
            info!(directory = %directory.display(), "Using filesystem artifact store");
            Ok(Arc::new(FilesystemContentStore::new(directory)))
        }
    }
}

fn store_directory<'a>(store: &'a StoreConfig, name: &str) -> Result<&'a Path> {
    store
        .directory
        .as_deref()
        .ok_or_else(|| anyhow!("The filesystem {} store requires a directory", name))
}

fn create_executor(config: &FolioConfig) -> Result<Arc<dyn DocumentExecutor>> {
    let executor = &config.execution.executor;
    match executor.kind {
        ExecutorKind::Passthrough => {
            info!("Using passthrough executor; documents are not run");
            Ok(Arc::new(PassthroughExecutor::new()))
        }
        ExecutorKind::Process => {
            let program = executor
                .program
                .as_deref()
                .ok_or_else(|| anyhow!("The process executor requires a program"))?;
            info!(program = %program, "Using process executor");
            let process = ProcessExecutorConfig::new(program).with_args(executor.args.clone());
            Ok(Arc::new(ProcessDocumentExecutor::new(process)))
        }
    }
}
