//! The client side of the polling contract.
//!
//! A stateless client reconstructs progress from repeated snapshot
//! reads: poll at a fixed interval, stop on a terminal status, and give
//! up after a total-duration ceiling. Exceeding the ceiling is a
//! *client-side* timeout ([`PollError::ClientTimeout`]) and must not be
//! confused with the server-side pipeline deadline, which surfaces as a
//! Failed job with the `TIMEOUT` error code.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ConvertError;
use crate::job::JobStatus;
use crate::types::JobId;

/// Point-in-time view of a job as served by the status endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub stage: String,
}

/// Anything that can produce job snapshots (an HTTP client in
/// production, a fake in tests).
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, id: JobId) -> Result<JobSnapshot, ConvertError>;
}

/// Polling parameters. Defaults follow the published contract:
/// 1-second interval, 60-second ceiling.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            ceiling: Duration::from_secs(60),
        }
    }
}

/// Errors a polling client can observe.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The ceiling elapsed without the job reaching a terminal status.
    /// Distinct from the pipeline's own `TIMEOUT` failure.
    #[error("No terminal status after polling for {ceiling_secs}s ({polls} polls)")]
    ClientTimeout { ceiling_secs: u64, polls: u32 },

    /// The status source itself failed (e.g. `JOB_NOT_FOUND`).
    #[error(transparent)]
    Source(#[from] ConvertError),
}

/// Poll `source` for `id` until a terminal snapshot or the ceiling.
///
/// The first read happens immediately; subsequent reads are spaced by
/// `config.interval`. The loop never sleeps past the ceiling.
pub async fn poll_until_terminal(
    source: &dyn StatusSource,
    id: JobId,
    config: PollConfig,
) -> Result<JobSnapshot, PollError> {
    let started = tokio::time::Instant::now();
    let mut polls: u32 = 0;
    let mut last_progress: u8 = 0;

    loop {
        let snapshot = source.fetch(id).await?;
        polls += 1;

        if snapshot.progress < last_progress {
            // Server contract violation; log it but keep polling.
            tracing::warn!(
                job_id = %id,
                from = last_progress,
                to = snapshot.progress,
                "Observed progress regression while polling",
            );
        }
        last_progress = last_progress.max(snapshot.progress);

        if snapshot.status.is_terminal() {
            return Ok(snapshot);
        }

        if started.elapsed() + config.interval >= config.ceiling {
            return Err(PollError::ClientTimeout {
                ceiling_secs: config.ceiling.as_secs(),
                polls,
            });
        }

        tokio::time::sleep(config.interval).await;
    }
}
