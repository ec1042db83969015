//! Upload gateway: accept a raster image, admit it, queue a job.
//!
//! Admission control happens before a job exists: a rejected upload
//! (wrong type, too large, empty, malformed multipart) produces an
//! error response with no job id and leaves no trace in the stores.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use govector_core::error::ConvertError;
use govector_core::job::OriginalInfo;
use govector_core::validation::{detect_format, validate_size};

use crate::error::{AppError, AppResult};
use crate::response::UploadResponse;
use crate::router::BODY_LIMIT_SLACK;
use crate::state::AppState;

/// POST /upload
///
/// Accepts a single `file` part, validates it by content, stores the
/// original, and enqueues a conversion job. Returns `201 Created` with
/// the job id; clients track progress via `GET /status/{job_id}`.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    // The transport body limit sits at ceiling + slack, so a body that
    // declares more than that would die in the multipart extractor with
    // a generic parse error. Reject it here first, from the declared
    // length, so oversize uploads always carry the stable code.
    if let Some(declared) = declared_length(&headers) {
        if declared > state.processing.max_upload_bytes + BODY_LIMIT_SLACK as u64 {
            return Err(ConvertError::FileTooLarge {
                actual_bytes: declared,
                max_bytes: state.processing.max_upload_bytes,
            }
            .into());
        }
    }

    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file_bytes = Some(bytes.to_vec());
        }
    }

    let content =
        file_bytes.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;

    // Admission: size ceiling first, then content-based type detection.
    // The client-supplied filename is never consulted.
    let size_bytes = validate_size(&content, state.processing.max_upload_bytes)?;
    let format = detect_format(&content)?;

    let stored_as = format!("original{}", format.extension());
    let job = state
        .jobs
        .create(OriginalInfo {
            format,
            size_bytes,
            stored_as: stored_as.clone(),
        })
        .await;

    if let Err(e) = state.files.put(job.id, &stored_as, &content).await {
        // The job exists but its bytes do not; fail it rather than
        // leave a queued job that can never run.
        let err = ConvertError::ProcessingFailed("could not persist the upload".to_string());
        let _ = state.jobs.mark_failed(job.id, &err).await;
        tracing::error!(job_id = %job.id, error = %e, "Failed to store upload");
        return Err(AppError::InternalError(e.to_string()));
    }

    state.queue.enqueue(job.id).await?;
    tracing::info!(job_id = %job.id, format = format.label(), size_bytes, "Upload accepted");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            job_id: job.id,
            status: job.status,
            created_at: job.created_at,
            message: "Image accepted for processing. Poll /status/{job_id} for progress.",
        }),
    ))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
