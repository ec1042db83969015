use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use govector_core::error::ConvertError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`ConvertError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON
/// error responses of the shape `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `govector_core`.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A feature the deployment has not configured (email delivery).
    #[error("Service unavailable: {0}")]
    Unconfigured(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retry_allowed) = match &self {
            AppError::Convert(err) => classify_convert_error(err),

            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Unconfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONFIGURED",
                msg.clone(),
                None,
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(retry) = retry_allowed {
            body["retry_allowed"] = json!(retry);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a domain error into an HTTP status, stable code, message,
/// and optional retry hint.
///
/// Validation failures map to 400, missing resources to 404, transport
/// failures to 502, the global deadline to 504. Anything internal is
/// sanitized to 500.
fn classify_convert_error(
    err: &ConvertError,
) -> (StatusCode, &'static str, String, Option<bool>) {
    let status = match err {
        ConvertError::InvalidFileType(_)
        | ConvertError::FileTooLarge { .. }
        | ConvertError::InvalidFormat(_)
        | ConvertError::JobNotCompleted(_) => StatusCode::BAD_REQUEST,

        ConvertError::JobNotFound(_) | ConvertError::FileNotFound { .. } => StatusCode::NOT_FOUND,

        ConvertError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,

        ConvertError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,

        // Stage failures surface through job records, not HTTP errors,
        // but keep a sane mapping for any direct path.
        ConvertError::ProcessingFailed(_)
        | ConvertError::BackgroundRemovalFailed(_)
        | ConvertError::VectorizationFailed(_)
        | ConvertError::TooComplex(_) => StatusCode::UNPROCESSABLE_ENTITY,

        ConvertError::InvalidTransition(_) | ConvertError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Internal domain error");
        return (
            status,
            "INTERNAL_ERROR",
            "An internal error occurred".to_string(),
            None,
        );
    }

    (status, err.code(), err.to_string(), Some(err.retry_allowed()))
}
