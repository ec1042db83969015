//! Email delivery endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use govector_core::error::ConvertError;
use govector_core::job::{JobStatus, OutputFormat};
use govector_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::response::EmailResponse;
use crate::state::AppState;

/// Request body for POST /email.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub job_id: JobId,
    pub recipient_email: String,
    /// One of `svg`, `eps`, `pdf`.
    pub file_format: String,
}

/// POST /email
///
/// Send one artifact of a completed job to the given address. All local
/// checks (format, job existence, completion, configuration) run before
/// any SMTP traffic; a transport failure maps to `DELIVERY_FAILED`.
pub async fn send_artifact(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> AppResult<Json<EmailResponse>> {
    let format = OutputFormat::parse(&request.file_format)?;

    let job = state.jobs.get(request.job_id).await?;
    if job.status != JobStatus::Completed {
        return Err(ConvertError::JobNotCompleted(job.id).into());
    }

    let mailer = state.mailer.as_ref().ok_or_else(|| {
        AppError::Unconfigured("email delivery is not configured on this server".to_string())
    })?;

    let artifact = state.files.get(job.id, format.filename()).await?;

    mailer
        .send_artifact(&request.recipient_email, &job, format, artifact)
        .await
        .map_err(|e| {
            tracing::warn!(job_id = %job.id, error = %e, "Email delivery failed");
            ConvertError::DeliveryFailed(e.to_string())
        })?;

    Ok(Json(EmailResponse {
        job_id: job.id,
        format: format.name(),
        message: "Artifact sent.",
    }))
}
