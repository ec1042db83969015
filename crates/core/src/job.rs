//! The job entity and its state machine.
//!
//! A [`Job`] tracks one conversion request from upload to terminal
//! outcome. Transitions are strictly forward
//! (`Queued → Processing → {Completed | Failed}`) and `progress` never
//! decreases while processing. The store crate owns enforcement; the
//! pure guards live here so they are testable without any store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle states of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Self-transitions are allowed only within `Processing` (repeated
    /// progress updates); everything else must move strictly forward.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Processing)
                | (Self::Processing, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Queued, Self::Failed)
        )
    }
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Raster formats accepted by the upload gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Heic,
}

impl ImageFormat {
    /// Extension used when persisting the original, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Heic => ".heic",
        }
    }

    /// MIME type for serving the original back to a client.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Heic => "image/heic",
        }
    }

    /// Short label used in result metadata (`original_format`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Heic => "heic",
        }
    }
}

/// The three vector/print output formats every completed job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Eps,
    Pdf,
}

/// All output formats, in rendering order.
pub const OUTPUT_FORMATS: [OutputFormat; 3] = [OutputFormat::Svg, OutputFormat::Eps, OutputFormat::Pdf];

impl OutputFormat {
    /// Canonical artifact filename for this format.
    pub fn filename(self) -> &'static str {
        match self {
            Self::Svg => "output.svg",
            Self::Eps => "output.eps",
            Self::Pdf => "output.pdf",
        }
    }

    /// MIME type for serving and mailing the artifact.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Eps => "application/postscript",
            Self::Pdf => "application/pdf",
        }
    }

    /// Short name used in URLs and the delivery request body.
    pub fn name(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
        }
    }

    /// Parse a client-supplied format name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "eps" => Ok(Self::Eps),
            "pdf" => Ok(Self::Pdf),
            other => Err(ConvertError::InvalidFormat(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Metadata about the uploaded original and where its bytes live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalInfo {
    pub format: ImageFormat,
    pub size_bytes: u64,
    /// Filename under the job's directory in the file store
    /// (e.g. `original.png`).
    pub stored_as: String,
}

/// One image-conversion request and its tracked state.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// 0–100, non-decreasing while processing.
    pub progress: u8,
    /// Human-readable label of the current stage.
    pub stage: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub original: OriginalInfo,
    /// Artifact filename per output format; populated only on Completed.
    pub artifacts: BTreeMap<OutputFormat, String>,
    /// Wall-clock processing duration; populated only on Completed.
    pub processing_time_seconds: Option<f64>,
    /// Populated only on Failed.
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub retry_allowed: Option<bool>,
}

impl Job {
    /// Create a fresh job in `Queued` state.
    pub fn new(original: OriginalInfo) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            status: JobStatus::Queued,
            progress: 0,
            stage: "Queued for processing".to_string(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            original,
            artifacts: BTreeMap::new(),
            processing_time_seconds: None,
            error_code: None,
            error_message: None,
            retry_allowed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_forward_only() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Processing));

        assert!(!Processing.can_transition_to(Queued));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Queued.can_transition_to(Completed));
    }

    #[test]
    fn queued_jobs_may_fail_directly() {
        // A job whose original bytes cannot be persisted fails before
        // any stage runs.
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"queued\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::parse("svg").unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::parse("PDF").unwrap(), OutputFormat::Pdf);
        assert!(matches!(
            OutputFormat::parse("docx"),
            Err(ConvertError::InvalidFormat(_))
        ));
    }

    #[test]
    fn output_format_filenames() {
        assert_eq!(OutputFormat::Svg.filename(), "output.svg");
        assert_eq!(OutputFormat::Eps.filename(), "output.eps");
        assert_eq!(OutputFormat::Pdf.filename(), "output.pdf");
    }

    #[test]
    fn new_job_starts_queued_at_zero() {
        let job = Job::new(OriginalInfo {
            format: ImageFormat::Png,
            size_bytes: 1234,
            stored_as: "original.png".into(),
        });
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert!(job.artifacts.is_empty());
        assert!(job.error_code.is_none());
        assert!(job.completed_at.is_none());
    }
}
