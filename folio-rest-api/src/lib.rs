//! # Folio REST API
//!
//! HTTP surface for submitting execution jobs and retrieving their results.
//!
//! ## Endpoints
//!
//! - `POST /jobs/{jobTypeId}/execute` - accept a job and hand it to the worker
//! - `GET /jobs/{jobId}/status` - poll until the job is terminal
//! - `GET /jobs/{jobId}` - job record with links to its artifacts
//! - `GET /jobs/{jobId}/artifacts/{kind}` - artifact content
//! - `GET /job-types` and `GET /job-types/{id}` - declared job types
//! - `GET /health` - liveness
//!
//! All job routes live under [`AppConfig::api_prefix`]; `/health` does not.
//!
//! ## Example
//!
//! ```rust,no_run
//! use folio_rest_api::{create_rest_app, ApiContext, AppConfig};
//!
//! # async fn example(context: ApiContext) -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_rest_app(context, AppConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod errors;
pub mod handlers;
pub mod models;

pub use app::{create_rest_app, ApiContext, AppConfig};
pub use errors::{RestError, RestResult};
