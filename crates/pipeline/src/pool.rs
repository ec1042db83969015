//! Job queue and worker pool.
//!
//! Accepted uploads are enqueued by id; a fixed set of worker tasks
//! pulls ids off a shared multi-consumer channel and hands each to the
//! executor. Workers stop either when the queue closes or when the pool
//! is cancelled during shutdown.

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use govector_core::error::ConvertError;
use govector_core::types::JobId;

use crate::executor::PipelineExecutor;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Cloneable handle for submitting job ids to the worker pool.
///
/// The channel is unbounded: admission control happens at upload time
/// (size ceiling, magic-byte check), not here.
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<JobId>,
}

impl JobQueue {
    pub fn new() -> (Self, Receiver<JobId>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Submit a job for processing. Fails only if the pool has shut
    /// down, which a live server never does while accepting uploads.
    pub async fn enqueue(&self, job_id: JobId) -> Result<(), ConvertError> {
        self.tx
            .send(job_id)
            .await
            .map_err(|_| ConvertError::Internal("job queue is closed".to_string()))
    }

    /// Jobs waiting for a worker. Exposed for the health endpoint.
    pub fn depth(&self) -> usize {
        self.tx.len()
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Fixed-size pool of worker tasks draining the job queue.
pub struct WorkerPool {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing one executor and one receiver.
    pub fn spawn(executor: Arc<PipelineExecutor>, rx: Receiver<JobId>, workers: usize) -> Self {
        let cancel = CancellationToken::new();
        let handles = (0..workers)
            .map(|worker| {
                let executor = Arc::clone(&executor);
                let rx = rx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker, "Worker started");
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            received = rx.recv() => match received {
                                Ok(job_id) => {
                                    tracing::info!(worker, job_id = %job_id, "Job picked up");
                                    executor.run(job_id).await;
                                }
                                // Sender dropped: nothing more will arrive.
                                Err(_) => break,
                            },
                        }
                    }
                    tracing::debug!(worker, "Worker stopped");
                })
            })
            .collect();
        Self { cancel, handles }
    }

    /// Stop accepting new work and wait for workers to exit. A job
    /// already handed to the executor finishes first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
