//! Server startup and shutdown logic

use anyhow::{anyhow, Context, Result};
use axum::Router;
use folio_config::FolioConfig;
use folio_execution::ExecutionWorker;
use folio_rest_api::{create_rest_app, AppConfig};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::services::ServiceContainer;

/// Server application struct
pub struct Server {
    config: FolioConfig,
    services: ServiceContainer,
}

impl Server {
    /// Build every service from `config`
    pub async fn new(config: FolioConfig) -> Result<Self> {
        let services = ServiceContainer::new(&config).await?;
        Ok(Self { config, services })
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// Build the REST application router
    pub fn build_app(&self) -> Router {
        let server = &self.config.server;
        let rest_config = AppConfig {
            api_prefix: server.api_prefix.clone(),
            enable_cors: server.enable_cors,
            enable_tracing: server.enable_tracing,
            status_retry_after: self.config.execution.status_retry_after,
        };
        create_rest_app(self.services.api_context(), rest_config)
    }

    /// Serve until a shutdown signal arrives
    ///
    /// Jobs left `Accepted` by a previous run are handed off again before the
    /// listener starts. On shutdown the listener stops first, then the
    /// worker finishes the jobs it is running.
    pub async fn start(mut self) -> Result<()> {
        let app = self.build_app();
        let addr = self.config.server.listen_address();
        self.log_config_summary();

        let queue = self
            .services
            .queue
            .take()
            .ok_or_else(|| anyhow!("Execution queue was already taken"))?;
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let worker = ExecutionWorker::new(
            self.services.engine.clone(),
            queue,
            self.config.execution.max_concurrent_jobs,
        )
        .spawn(async move {
            let _ = stop_rx.changed().await;
        });

        let recovery = self.services.engine.recover().await?;
        if !recovery.stuck.is_empty() {
            warn!(
                count = recovery.stuck.len(),
                "Jobs were interrupted while executing by a previous run"
            );
        }

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Folio server listening on {}", addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = stop_tx.send(true);
            })
            .await;

        // The sender is gone by now, which also stops the worker
        if let Err(e) = worker.await {
            error!(error = %e, "Execution worker panicked");
        }
        served?;

        info!("Server shutdown complete");
        Ok(())
    }

    fn log_config_summary(&self) {
        let config = &self.config;
        info!("=== Folio Server Configuration ===");
        info!("Listen address: {}", config.server.listen_address());
        info!(
            "API prefix: {}",
            if config.server.api_prefix.is_empty() {
                "/"
            } else {
                config.server.api_prefix.as_str()
            }
        );
        info!("Job types: {}", config.job_types.directory.display());
        info!(
            "Loaded job types: {} ({} skipped)",
            self.services.job_type_report.loaded.len(),
            self.services.job_type_report.skipped.len()
        );
        info!("Executor: {:?}", config.execution.executor.kind);
        info!("Max concurrent jobs: {}", config.execution.max_concurrent_jobs);
        info!(
            "Execution timeout: {}s",
            config.execution.execution_timeout.as_secs()
        );
        info!("==================================");
    }
}

/// Graceful shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
