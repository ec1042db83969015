//! Job store: durable record of job state with atomic per-job updates.
//!
//! Writes to one job are serialized by a per-job lock; reads clone the
//! last committed snapshot, so a reader never observes a torn update
//! and never blocks on anything longer than a single write. Distinct
//! jobs share no lock, so they update and read concurrently.
//!
//! The state machine is enforced here: transitions are strictly forward
//! and any mutation of a terminal job is rejected, which also closes
//! the door on a second writer resurrecting a finished job.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use govector_core::error::ConvertError;
use govector_core::job::{Job, JobStatus, OriginalInfo, OutputFormat, OUTPUT_FORMATS};
use govector_core::types::JobId;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The mutation and read surface of the job store.
///
/// `update` is the only call sites outside the executor never make:
/// jobs are mutated exclusively by the pipeline while processing and
/// become immutable once terminal.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job in `Queued` state and return its snapshot.
    async fn create(&self, original: OriginalInfo) -> Job;

    /// Read the current snapshot of a job.
    async fn get(&self, id: JobId) -> Result<Job, ConvertError>;

    /// Advance progress and stage label. Promotes `Queued` to
    /// `Processing` on first call; progress is clamped so it never
    /// decreases.
    async fn update(&self, id: JobId, progress: u8, stage: &str) -> Result<(), ConvertError>;

    /// Transition to `Completed` with the full artifact set.
    async fn mark_completed(
        &self,
        id: JobId,
        artifacts: BTreeMap<OutputFormat, String>,
        processing_time_seconds: f64,
    ) -> Result<Job, ConvertError>;

    /// Transition to `Failed`, recording the error's stable code,
    /// message, and retry guidance.
    async fn mark_failed(&self, id: JobId, error: &ConvertError) -> Result<Job, ConvertError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-process job store backed by a map of per-job locks.
///
/// The outer map lock is held only to resolve an id to its slot; all
/// job mutation happens under that job's own lock.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<RwLock<Job>>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: JobId) -> Result<Arc<RwLock<Job>>, ConvertError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ConvertError::JobNotFound(id))
    }

    /// Number of jobs ever created. Used by tests to assert that a
    /// rejected upload created nothing.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, original: OriginalInfo) -> Job {
        let job = Job::new(original);
        let snapshot = job.clone();
        self.jobs
            .write()
            .await
            .insert(job.id, Arc::new(RwLock::new(job)));
        tracing::debug!(job_id = %snapshot.id, "Job created");
        snapshot
    }

    async fn get(&self, id: JobId) -> Result<Job, ConvertError> {
        let slot = self.slot(id).await?;
        let job = slot.read().await;
        Ok(job.clone())
    }

    async fn update(&self, id: JobId, progress: u8, stage: &str) -> Result<(), ConvertError> {
        let slot = self.slot(id).await?;
        let mut job = slot.write().await;

        if !job.status.can_transition_to(JobStatus::Processing) {
            return Err(ConvertError::InvalidTransition(format!(
                "cannot update job in {:?} state",
                job.status
            )));
        }

        job.status = JobStatus::Processing;
        // Monotonic: a late or out-of-band sub-value can never move the
        // visible progress backwards.
        job.progress = job.progress.max(progress.min(100));
        job.stage = stage.to_string();
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: JobId,
        artifacts: BTreeMap<OutputFormat, String>,
        processing_time_seconds: f64,
    ) -> Result<Job, ConvertError> {
        let slot = self.slot(id).await?;
        let mut job = slot.write().await;

        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(ConvertError::InvalidTransition(format!(
                "cannot complete job in {:?} state",
                job.status
            )));
        }
        // Completed implies the full artifact set.
        for format in OUTPUT_FORMATS {
            if !artifacts.contains_key(&format) {
                return Err(ConvertError::Internal(format!(
                    "completion missing {} artifact",
                    format.name()
                )));
            }
        }

        let now = chrono::Utc::now();
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.stage = "Complete".to_string();
        job.artifacts = artifacts;
        job.processing_time_seconds = Some(processing_time_seconds);
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(job.clone())
    }

    async fn mark_failed(&self, id: JobId, error: &ConvertError) -> Result<Job, ConvertError> {
        let slot = self.slot(id).await?;
        let mut job = slot.write().await;

        if !job.status.can_transition_to(JobStatus::Failed) {
            return Err(ConvertError::InvalidTransition(format!(
                "cannot fail job in {:?} state",
                job.status
            )));
        }

        let now = chrono::Utc::now();
        job.status = JobStatus::Failed;
        job.stage = "Failed".to_string();
        job.error_code = Some(error.code().to_string());
        job.error_message = Some(error.to_string());
        job.retry_allowed = Some(error.retry_allowed());
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(job.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
