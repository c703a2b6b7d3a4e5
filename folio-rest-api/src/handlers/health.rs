//! Health check endpoint

use axum::{response::IntoResponse, Json};
use tracing::debug;

use crate::models::HealthResponse;

pub async fn health_check() -> impl IntoResponse {
    debug!("Health check requested");
    Json(HealthResponse::healthy())
}
