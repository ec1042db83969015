use std::sync::Arc;

use govector_delivery::EmailDelivery;
use govector_pipeline::JobQueue;
use govector_store::{FileStore, JobStore};

use crate::config::{ProcessingConfig, ServerConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Job records.
    pub jobs: Arc<dyn JobStore>,
    /// Originals and rendered artifacts on disk.
    pub files: Arc<FileStore>,
    /// Submission side of the worker pool.
    pub queue: JobQueue,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upload ceiling and pipeline bounds.
    pub processing: Arc<ProcessingConfig>,
    /// SMTP delivery, present only when `SMTP_HOST` is configured.
    pub mailer: Option<Arc<EmailDelivery>>,
}
