//! Status and result endpoints.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use govector_core::job::JobStatus;
use govector_core::types::JobId;

use crate::error::AppResult;
use crate::response::{PendingResponse, ResultResponse, StatusResponse};
use crate::state::AppState;

/// GET /status/{job_id}
///
/// Snapshot of a job's progress. Progress and stage label always come
/// from the same committed update, so a poller never sees a mixed pair.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<StatusResponse>> {
    let job = state.jobs.get(job_id).await?;
    Ok(Json(job.into()))
}

/// GET /result/{job_id}
///
/// For a completed job, download links for all three artifacts. For a
/// job still in flight, a pending body rather than an error, so clients
/// that skip polling still get a useful answer. For a failed job, the
/// recorded failure.
pub async fn job_result(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Response> {
    let job = state.jobs.get(job_id).await?;

    let response = match job.status {
        JobStatus::Completed => Json(ResultResponse::from_completed(&job)).into_response(),
        JobStatus::Queued | JobStatus::Processing => Json(PendingResponse {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            message: "Job is still processing. Poll /status/{job_id} for progress.",
        })
        .into_response(),
        JobStatus::Failed => Json(StatusResponse::from(job)).into_response(),
    };
    Ok(response)
}
