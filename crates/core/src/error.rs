//! Domain error taxonomy.
//!
//! Every failure a client can observe carries a stable `SCREAMING_CASE`
//! code plus a human-readable message. Engine internals must never leak
//! unmapped into a response: adapters return these variants directly,
//! and anything unexpected is wrapped in [`ConvertError::Internal`]
//! before it reaches the HTTP layer.

use crate::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The uploaded bytes are not one of the supported raster formats.
    #[error("Unsupported file type: {0}. Please upload a JPG, PNG, or HEIC image.")]
    InvalidFileType(String),

    /// The upload exceeds the configured size ceiling.
    #[error("File too large ({actual_bytes} bytes). Maximum size is {max_bytes} bytes.")]
    FileTooLarge { actual_bytes: u64, max_bytes: u64 },

    /// A stage failed in a way that has no more specific code.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The background removal engine reported a failure.
    #[error("Background removal failed: {0}")]
    BackgroundRemovalFailed(String),

    /// The vector tracing engine reported a failure.
    #[error("Vectorization failed: {0}")]
    VectorizationFailed(String),

    /// The image exceeds the tracer's complexity threshold. Retrying
    /// with the same image cannot succeed.
    #[error("Image too complex to vectorize: {0}")]
    TooComplex(String),

    /// No job exists with the given id.
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The global processing deadline elapsed before the pipeline
    /// reached a terminal state.
    #[error("Processing exceeded the {deadline_secs}s deadline")]
    Timeout { deadline_secs: u64 },

    /// The requested artifact does not exist, or the job has not
    /// completed yet.
    #[error("File not found: {filename}")]
    FileNotFound { filename: String },

    /// Delivery was requested for a job that is not in the Completed
    /// state.
    #[error("Job {0} has not completed yet")]
    JobNotCompleted(JobId),

    /// The requested output format is not one of svg, eps, or pdf.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The delivery transport failed after all local checks passed.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// A write was attempted against a job in a state that forbids it.
    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),

    /// Anything that should never surface verbatim to a client.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Stable machine-readable code for client consumption.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::ProcessingFailed(_) => "PROCESSING_FAILED",
            Self::BackgroundRemovalFailed(_) => "BACKGROUND_REMOVAL_FAILED",
            Self::VectorizationFailed(_) => "VECTORIZATION_FAILED",
            Self::TooComplex(_) => "TOO_COMPLEX",
            Self::JobNotFound(_) => "JOB_NOT_FOUND",
            Self::Timeout { .. } => "TIMEOUT",
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::JobNotCompleted(_) => "JOB_NOT_COMPLETED",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::DeliveryFailed(_) => "DELIVERY_FAILED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether resubmitting the same input could plausibly succeed.
    ///
    /// `TOO_COMPLEX` requires a different image; validation errors
    /// require a different file; everything transient is retryable.
    pub fn retry_allowed(&self) -> bool {
        !matches!(
            self,
            Self::TooComplex(_)
                | Self::InvalidFileType(_)
                | Self::FileTooLarge { .. }
                | Self::InvalidFormat(_)
        )
    }
}
