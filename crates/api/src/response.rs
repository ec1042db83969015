//! Typed response payloads for API handlers.
//!
//! Job-record surfaces (status, result) expose the record's own field
//! names (`error_code`, `error_message`, `retry_allowed`); HTTP error
//! responses are produced by [`crate::error::AppError`] with the
//! `{ "error": ..., "code": ... }` shape.

use std::collections::BTreeMap;

use serde::Serialize;

use govector_core::job::{Job, JobStatus, OutputFormat, OUTPUT_FORMATS};
use govector_core::types::{JobId, Timestamp};

/// Response for an accepted upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub message: &'static str,
}

/// Response for a status poll.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub stage: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_allowed: Option<bool>,
}

impl From<Job> for StatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            stage: job.stage,
            created_at: job.created_at,
            updated_at: job.updated_at,
            error_code: job.error_code,
            error_message: job.error_message,
            retry_allowed: job.retry_allowed,
        }
    }
}

/// Metadata block inside a completed result.
#[derive(Debug, Serialize)]
pub struct ResultMetadata {
    pub original_format: &'static str,
    pub original_size_bytes: u64,
    pub processing_time_seconds: Option<f64>,
}

/// Response for a completed job's result.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Download path per file name: `original` plus one per format.
    pub files: BTreeMap<&'static str, String>,
    pub metadata: ResultMetadata,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl ResultResponse {
    /// Build the result body for a completed job, with one download
    /// path per stored file.
    pub fn from_completed(job: &Job) -> Self {
        let mut files: BTreeMap<&'static str, String> = OUTPUT_FORMATS
            .iter()
            .map(|f| (f.name(), download_path(job.id, f.filename())))
            .collect();
        files.insert("original", download_path(job.id, &job.original.stored_as));

        Self {
            job_id: job.id,
            status: job.status,
            files,
            metadata: ResultMetadata {
                original_format: job.original.format.label(),
                original_size_bytes: job.original.size_bytes,
                processing_time_seconds: job.processing_time_seconds,
            },
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// Result request against a job that is still in flight.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: &'static str,
}

/// Response for an accepted email delivery.
#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub job_id: JobId,
    pub format: &'static str,
    pub message: &'static str,
}

fn download_path(job_id: JobId, filename: &str) -> String {
    format!("/files/{job_id}/{filename}")
}
