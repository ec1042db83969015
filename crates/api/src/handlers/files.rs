//! Artifact download endpoint.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use govector_core::error::ConvertError;
use govector_core::job::JobStatus;
use govector_core::types::JobId;
use govector_store::files::content_type_for;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /files/{job_id}/{filename}
///
/// Serves a stored file (artifact or original) for a completed job.
/// Files of jobs that have not completed are withheld as not-found so
/// partially written artifacts can never be observed.
pub async fn download(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(JobId, String)>,
) -> AppResult<Response> {
    let job = state.jobs.get(job_id).await?;

    if job.status != JobStatus::Completed {
        return Err(ConvertError::FileNotFound { filename }.into());
    }

    let bytes = state.files.get(job_id, &filename).await?;
    let content_type = content_type_for(&filename);

    tracing::debug!(job_id = %job_id, filename, size = bytes.len(), "File served");
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
