//! Shared environment for the end-to-end tests
//!
//! Each environment owns a temporary directory holding a job types tree and
//! filesystem job and artifact stores, so that a second [`TestEnv::start`]
//! sees what the first one persisted.

#![allow(dead_code)]

use axum::Router;
use folio_config::{ExecutorConfig, ExecutorKind, FolioConfig, StoreConfig};
use folio_core::{Job, JobId};
use folio_execution::{ExecutionWorker, LifecycleEngine};
use folio_rest_api::{create_rest_app, AppConfig};
use folio_server::ServiceContainer;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct TestEnv {
    pub dir: TempDir,
    pub config: FolioConfig,
}

impl TestEnv {
    /// An `echo` job type whose template already carries the output `[1, 2]`
    ///
    /// The passthrough executor returns documents unchanged, so the output
    /// cell survives execution as if the document had produced it.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let job_types = dir.path().join("job_types");
        fs::create_dir_all(job_types.join("reports")).unwrap();

        let echo = json!({
            "metadata": {"kernelspec": {"language": "python"}},
            "nbformat": 4,
            "nbformat_minor": 5,
            "cells": [
                {
                    "cell_type": "code",
                    "metadata": {"tags": ["parameters"]},
                    "source": "x = 0",
                    "outputs": []
                },
                {
                    "cell_type": "code",
                    "metadata": {},
                    "source": "emit([x, x + 1])",
                    "outputs": [{
                        "output_type": "display_data",
                        "metadata": {},
                        "data": {"application/vnd.folio.output+json": "[1, 2]"}
                    }]
                }
            ]
        });
        fs::write(job_types.join("echo.ipynb"), echo.to_string()).unwrap();
        fs::write(
            job_types.join("echo.config.json"),
            json!({
                "input": {
                    "type": "object",
                    "properties": {"x": {"type": "number"}},
                    "required": ["x"]
                },
                "output": {"type": "array", "items": {"type": "number"}}
            })
            .to_string(),
        )
        .unwrap();

        fs::write(
            job_types.join("reports").join("daily.ipynb"),
            json!({"metadata": {}, "cells": []}).to_string(),
        )
        .unwrap();
        fs::write(
            job_types.join("reports").join("daily.config.json"),
            json!({
                "input": {
                    "type": "object",
                    "properties": {"source": {"$ref": "typed://folio.Artifact"}}
                }
            })
            .to_string(),
        )
        .unwrap();

        let mut config = FolioConfig::default();
        config.job_types.directory = job_types;
        config.storage.jobs = StoreConfig::filesystem(dir.path().join("data").join("jobs"));
        config.storage.artifacts =
            StoreConfig::filesystem(dir.path().join("data").join("artifacts"));
        config.execution.max_concurrent_jobs = 2;

        Self { dir, config }
    }

    /// Run documents through `sh -c script` instead of passing them through
    pub fn with_shell_executor(mut self, script: &str) -> Self {
        self.config.execution.executor = ExecutorConfig {
            kind: ExecutorKind::Process,
            program: Some("sh".to_string()),
            args: vec!["-c".to_string(), script.to_string()],
            ..ExecutorConfig::default()
        };
        self
    }

    /// Build the services without starting the worker
    pub async fn services(&self) -> ServiceContainer {
        ServiceContainer::new(&self.config).await.unwrap()
    }

    /// Build the services and start the execution worker
    pub async fn start(&self) -> Running {
        let mut services = self.services().await;
        let queue = services.queue.take().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let worker = ExecutionWorker::new(
            services.engine.clone(),
            queue,
            self.config.execution.max_concurrent_jobs,
        )
        .spawn(async move {
            let _ = stopped.await;
        });

        let router = create_rest_app(services.api_context(), AppConfig::default());
        Running {
            engine: services.engine.clone(),
            router,
            stop: Some(stop),
            worker,
        }
    }
}

pub struct Running {
    pub engine: Arc<LifecycleEngine>,
    pub router: Router,
    stop: Option<oneshot::Sender<()>>,
    worker: JoinHandle<()>,
}

impl Running {
    pub async fn wait_for_terminal(&self, job_id: &JobId) -> Job {
        for _ in 0..500 {
            let job = self.engine.get_job(job_id).await.unwrap();
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }

    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.worker.await.unwrap();
    }
}
