//! Job submission and tracking endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use folio_core::{ArtifactKind, JobId};
use tracing::error;

use crate::{
    app::AppState,
    errors::{RestError, RestResult},
    models::{ExecuteRequest, ExecuteResponse, JobResponse, StatusResponse},
};

/// Accept a job and hand it off for execution
///
/// Responds `202 Accepted` with a `Location` header pointing at the status
/// endpoint. A failed handoff is logged; the job stays `Accepted` and is
/// picked up again by recovery.
pub async fn execute_job(
    State(state): State<AppState>,
    Path(job_type_id): Path<String>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> RestResult<Response> {
    let Json(request) = body.map_err(|rejection| RestError::bad_request(rejection.body_text()))?;

    let engine = &state.context.engine;
    let job = engine.accept(&job_type_id, request.parameters).await?;
    if let Err(e) = engine.begin(&job).await {
        error!(job_id = %job.job_id, error = %e, "Failed to hand off accepted job");
    }

    let location = state.links.status(&job.job_id);
    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, location)],
        Json(ExecuteResponse::from(&job)),
    )
        .into_response())
}

/// Poll a job
///
/// `200` with `Retry-After` while the job is pending, `302` to the job
/// record once it is terminal.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> RestResult<Response> {
    let job_id = JobId::from(job_id);
    let job = state.context.engine.get_job(&job_id).await?;

    if job.is_terminal() {
        let location = state.links.job(&job_id);
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::LOCATION, state.links.status(&job_id)),
            (header::RETRY_AFTER, state.status_retry_after.as_secs().to_string()),
        ],
        Json(StatusResponse {
            job_id,
            status: job.status,
        }),
    )
        .into_response())
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> RestResult<impl IntoResponse> {
    let job_id = JobId::from(job_id);
    let job = state.context.engine.get_job(&job_id).await?;
    let links = &state.links;
    Ok(Json(JobResponse::new(job, |kind| links.artifact(&job_id, kind))))
}

/// Content of one artifact, typed by its kind
pub async fn get_job_artifact(
    State(state): State<AppState>,
    Path((job_id, kind)): Path<(String, String)>,
) -> RestResult<Response> {
    let kind: ArtifactKind = kind
        .parse()
        .map_err(|_| RestError::not_found(format!("Unknown artifact kind: {}", kind)))?;
    let (_, content) = state
        .context
        .engine
        .get_artifact(&JobId::from(job_id), kind)
        .await?;

    Ok(([(header::CONTENT_TYPE, kind.content_type())], content).into_response())
}
