//! Shared fixtures for the engine and worker tests

use crate::lifecycle::LifecycleEngineBuilder;
use crate::output::output_display_data;
use crate::parameterizer::PARAMETERS_TAG;
use crate::LifecycleEngine;
use async_trait::async_trait;
use folio_core::{Cell, Document, FolioResult, JobId, JobTypeDescriptor};
use folio_interfaces::{DocumentExecutor, ExecutionReport, TaskHandoff};
use folio_schema::{SchemaBinder, TypeRegistry};
use folio_storage::{
    ArtifactClient, InMemoryContentStore, InMemoryJobRepository, InMemoryJobTypeRepository,
    JobCodec,
};
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};

pub fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    folio_core::register_domain_types(&mut registry);
    Arc::new(registry)
}

pub fn echo_parameters(x: i64) -> JsonValue {
    json!({ "x": x })
}

pub fn template() -> Document {
    Document::new(vec![
        Cell::code("x = 0", &[PARAMETERS_TAG]),
        Cell::code("emit([x, x + 1])", &[]),
    ])
}

/// Emits `[x, x + 1]` for the injected parameter `x`
pub struct EchoExecutor;

#[async_trait]
impl DocumentExecutor for EchoExecutor {
    async fn execute(&self, mut document: Document) -> FolioResult<ExecutionReport> {
        let x = document.metadata["folio"]["parameters"]["x"]
            .as_i64()
            .unwrap_or_default();
        if let Some(cell) = document.cells.last_mut() {
            cell.outputs = Some(vec![output_display_data(json!([x, x + 1]))]);
        }
        Ok(ExecutionReport::succeeded(document))
    }
}

/// Records submitted job ids without running them
#[derive(Default)]
pub struct RecordingHandoff {
    pub submitted: Mutex<Vec<JobId>>,
}

impl RecordingHandoff {
    pub fn submitted(&self) -> Vec<JobId> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskHandoff for RecordingHandoff {
    async fn submit(&self, job_id: &JobId) -> FolioResult<()> {
        self.submitted.lock().unwrap().push(job_id.clone());
        Ok(())
    }
}

pub struct Fixture {
    pub binder: Arc<SchemaBinder>,
    pub codec: JobCodec,
    pub jobs: Arc<InMemoryJobRepository>,
    pub job_types: Arc<InMemoryJobTypeRepository>,
    pub artifacts: Arc<ArtifactClient>,
}

impl Fixture {
    /// Repositories with the `echo` job type registered
    pub async fn new() -> Self {
        let registry = registry();
        let binder = Arc::new(SchemaBinder::new(registry.clone()));
        let codec = JobCodec::new(registry);
        let job_types = Arc::new(InMemoryJobTypeRepository::new(binder.clone()));
        job_types
            .insert(
                "echo",
                JobTypeDescriptor {
                    id: None,
                    input: json!({
                        "type": "object",
                        "properties": {"x": {"type": "number"}},
                        "required": ["x"]
                    }),
                    output: json!({"type": "array", "items": {"type": "number"}}),
                },
                template(),
            )
            .await
            .unwrap();

        Self {
            binder,
            jobs: Arc::new(InMemoryJobRepository::new(codec.clone())),
            codec,
            job_types,
            artifacts: Arc::new(ArtifactClient::new(Arc::new(InMemoryContentStore::new()))),
        }
    }

    pub fn engine(
        &self,
        executor: Arc<dyn DocumentExecutor>,
        handoff: Arc<dyn TaskHandoff>,
    ) -> LifecycleEngineBuilder {
        LifecycleEngine::builder()
            .with_job_repository(self.jobs.clone())
            .with_job_type_repository(self.job_types.clone())
            .with_artifact_store(self.artifacts.clone())
            .with_binder(self.binder.clone())
            .with_executor(executor)
            .with_handoff(handoff)
    }
}
