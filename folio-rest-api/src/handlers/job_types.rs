//! Job type endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::{
    app::AppState,
    errors::RestResult,
    models::{JobTypeListResponse, JobTypeResponse},
};

/// Ids of every declared job type, sorted
pub async fn list_job_types(State(state): State<AppState>) -> RestResult<impl IntoResponse> {
    let job_types = state.context.job_types.list_ids().await?;
    debug!(count = job_types.len(), "Listing job types");
    Ok(Json(JobTypeListResponse { job_types }))
}

/// A job type with its resolved input and output schemas
pub async fn get_job_type(
    State(state): State<AppState>,
    Path(job_type_id): Path<String>,
) -> RestResult<impl IntoResponse> {
    let job_type = state.context.job_types.get(&job_type_id).await?;
    Ok(Json(JobTypeResponse::from(job_type.as_ref())))
}
