//! Application configuration and router setup

use axum::{
    routing::{get, post},
    Router,
};
use folio_core::JobId;
use folio_execution::LifecycleEngine;
use folio_interfaces::JobTypeRepository;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Enable CORS middleware
    pub enable_cors: bool,
    /// Enable request tracing
    pub enable_tracing: bool,
    /// Path prefix of the job and job type routes, empty or starting with `/`
    pub api_prefix: String,
    /// Delay suggested to clients polling a pending job
    pub status_retry_after: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_tracing: true,
            api_prefix: String::new(),
            status_retry_after: Duration::from_secs(1),
        }
    }
}

/// Dependencies of the REST handlers
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<LifecycleEngine>,
    pub job_types: Arc<dyn JobTypeRepository>,
}

impl ApiContext {
    pub fn new(engine: Arc<LifecycleEngine>, job_types: Arc<dyn JobTypeRepository>) -> Self {
        Self { engine, job_types }
    }
}

/// Handler state: the context plus what handlers need to build links
#[derive(Clone)]
pub struct AppState {
    pub context: ApiContext,
    pub links: Links,
    pub status_retry_after: Duration,
}

/// Absolute paths of job resources under the API prefix
#[derive(Debug, Clone)]
pub struct Links {
    prefix: String,
}

impl Links {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn job(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{}", self.prefix, job_id)
    }

    pub fn status(&self, job_id: &JobId) -> String {
        format!("{}/status", self.job(job_id))
    }

    pub fn artifact(&self, job_id: &JobId, kind: &str) -> String {
        format!("{}/artifacts/{}", self.job(job_id), kind)
    }
}

/// Create the complete REST API application
pub fn create_rest_app(context: ApiContext, config: AppConfig) -> Router {
    let state = AppState {
        context,
        links: Links::new(config.api_prefix.clone()),
        status_retry_after: config.status_retry_after,
    };

    let api = create_api_router();
    let api = if config.api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(&config.api_prefix, api)
    };

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        .with_state(state);

    // Applied in reverse order
    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    if config.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        // `{id}` is a job type id for `execute` and a job id otherwise
        .route("/jobs/{id}/execute", post(handlers::execute_job))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/status", get(handlers::get_job_status))
        .route("/jobs/{id}/artifacts/{kind}", get(handlers::get_job_artifact))
        .route("/job-types", get(handlers::list_job_types))
        .route("/job-types/{*job_type_id}", get(handlers::get_job_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_without_prefix() {
        let links = Links::new("");
        let job_id = JobId::from("abc");
        assert_eq!(links.job(&job_id), "/jobs/abc");
        assert_eq!(links.status(&job_id), "/jobs/abc/status");
        assert_eq!(links.artifact(&job_id, "html"), "/jobs/abc/artifacts/html");
    }

    #[test]
    fn test_links_with_prefix() {
        let links = Links::new("/api");
        assert_eq!(links.status(&JobId::from("abc")), "/api/jobs/abc/status");
    }
}
