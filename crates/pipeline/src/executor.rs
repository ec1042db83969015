//! Staged execution of one conversion job.
//!
//! The executor walks [`STAGE_PLAN`] in order: commit the band's lower
//! bound and label, invoke the stage under a per-stage timeout, commit
//! the upper bound, continue. Any stage failure maps to a domain error
//! code and transitions the job to Failed; nothing is retried. The
//! whole walk runs under the global deadline, enforced here rather than
//! trusted to any adapter, so a job can never sit in Processing
//! forever.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use govector_core::error::ConvertError;
use govector_core::job::{OutputFormat, OUTPUT_FORMATS};
use govector_core::stages::{StageKind, StageSpec, STAGE_PLAN};
use govector_core::types::JobId;
use govector_core::validation::detect_format;
use govector_engines::vector::VectorDocument;
use govector_engines::{BackgroundRemover, ColorMode, FormatRenderer, VectorTracer};
use govector_store::{FileStore, JobStore};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Time bounds for pipeline execution. Both are deployment inputs, not
/// core logic.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Ceiling for a single adapter invocation.
    pub stage_timeout: Duration,
    /// Hard ceiling for the whole pipeline; elapsing it fails the job
    /// with `TIMEOUT` regardless of which stage is active.
    pub deadline: Duration,
    /// Hint forwarded to the tracer.
    pub color_mode: ColorMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(20),
            deadline: Duration::from_secs(30),
            color_mode: ColorMode::Color,
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs the stage sequence for individual jobs. One instance is shared
/// by all workers; per-job exclusivity comes from each id being queued
/// exactly once.
pub struct PipelineExecutor {
    jobs: Arc<dyn JobStore>,
    files: Arc<FileStore>,
    remover: Arc<dyn BackgroundRemover>,
    tracer: Arc<dyn VectorTracer>,
    renderer: Arc<dyn FormatRenderer>,
    config: PipelineConfig,
}

impl PipelineExecutor {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        files: Arc<FileStore>,
        remover: Arc<dyn BackgroundRemover>,
        tracer: Arc<dyn VectorTracer>,
        renderer: Arc<dyn FormatRenderer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            jobs,
            files,
            remover,
            tracer,
            renderer,
            config,
        }
    }

    /// Process one job to a terminal state. Never returns an error: all
    /// failures are recorded on the job itself.
    pub async fn run(&self, job_id: JobId) {
        let started = tokio::time::Instant::now();

        let outcome = tokio::time::timeout(self.config.deadline, self.run_stages(job_id)).await;

        match outcome {
            Ok(Ok(artifacts)) => {
                let secs = started.elapsed().as_secs_f64();
                match self.jobs.mark_completed(job_id, artifacts, secs).await {
                    Ok(_) => {
                        tracing::info!(job_id = %job_id, secs, "Job completed");
                    }
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to record completion");
                    }
                }
            }
            Ok(Err(err)) => self.record_failure(job_id, err).await,
            Err(_elapsed) => {
                let err = ConvertError::Timeout {
                    deadline_secs: self.config.deadline.as_secs(),
                };
                self.record_failure(job_id, err).await;
            }
        }
    }

    async fn record_failure(&self, job_id: JobId, err: ConvertError) {
        let err = sanitize(err);
        tracing::warn!(job_id = %job_id, code = err.code(), error = %err, "Job failed");
        if let Err(e) = self.jobs.mark_failed(job_id, &err).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to record job failure");
        }
    }

    async fn run_stages(
        &self,
        job_id: JobId,
    ) -> Result<BTreeMap<OutputFormat, String>, ConvertError> {
        let job = self.jobs.get(job_id).await?;
        let mut raster: Vec<u8> = Vec::new();
        let mut traced: Option<VectorDocument> = None;
        let mut artifacts = BTreeMap::new();

        for spec in &STAGE_PLAN {
            self.jobs.update(job_id, spec.band.0, spec.label).await?;
            tracing::debug!(job_id = %job_id, stage = spec.label, "Stage started");

            match spec.kind {
                StageKind::Validate => {
                    raster = self
                        .files
                        .get(job_id, &job.original.stored_as)
                        .await
                        .map_err(|_| {
                            ConvertError::ProcessingFailed(
                                "original upload is missing from storage".to_string(),
                            )
                        })?;
                    detect_format(&raster)?;
                }
                StageKind::RemoveBackground => {
                    raster = self
                        .bounded(spec, self.remover.remove_background(&raster))
                        .await?;
                }
                StageKind::Vectorize => {
                    traced = Some(
                        self.bounded(spec, self.tracer.trace(&raster, self.config.color_mode))
                            .await?,
                    );
                }
                StageKind::Render => {
                    let doc = traced.as_ref().ok_or_else(|| {
                        ConvertError::Internal("render reached without a traced document".into())
                    })?;
                    for format in OUTPUT_FORMATS {
                        let bytes = self.bounded(spec, self.renderer.render(doc, format)).await?;
                        self.files.put(job_id, format.filename(), &bytes).await?;
                        artifacts.insert(format, format.filename().to_string());
                    }
                }
            }

            self.jobs.update(job_id, spec.band.1, spec.label).await?;
        }

        Ok(artifacts)
    }

    /// Run one adapter call under the per-stage timeout. A stage that
    /// overruns maps to that stage's failure code; only the global
    /// deadline produces `TIMEOUT`.
    async fn bounded<T>(
        &self,
        spec: &StageSpec,
        fut: impl std::future::Future<Output = Result<T, ConvertError>>,
    ) -> Result<T, ConvertError> {
        match tokio::time::timeout(self.config.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let msg = format!(
                    "stage timed out after {}s",
                    self.config.stage_timeout.as_secs()
                );
                Err(match spec.kind {
                    StageKind::RemoveBackground => ConvertError::BackgroundRemovalFailed(msg),
                    StageKind::Vectorize => ConvertError::VectorizationFailed(msg),
                    _ => ConvertError::ProcessingFailed(msg),
                })
            }
        }
    }
}

/// Collapse errors with no client-facing meaning into the generic
/// stage-failure code so internals never leak into a job record.
fn sanitize(err: ConvertError) -> ConvertError {
    match err {
        ConvertError::Internal(msg) | ConvertError::InvalidTransition(msg) => {
            tracing::error!(error = %msg, "Internal pipeline error");
            ConvertError::ProcessingFailed("an internal error occurred".to_string())
        }
        ConvertError::FileNotFound { .. } | ConvertError::JobNotFound(_) => {
            ConvertError::ProcessingFailed("job state was lost during processing".to_string())
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use govector_core::job::{ImageFormat, JobStatus, OriginalInfo};
    use govector_engines::vector::{ColorLayer, Run};
    use govector_store::MemoryJobStore;
    use std::sync::Mutex;

    // -- Fakes ---------------------------------------------------------------

    struct PassthroughRemover;

    #[async_trait]
    impl BackgroundRemover for PassthroughRemover {
        async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, ConvertError> {
            Ok(image.to_vec())
        }
    }

    /// Remover that sleeps far past any configured bound.
    struct StuckRemover;

    #[async_trait]
    impl BackgroundRemover for StuckRemover {
        async fn remove_background(&self, _image: &[u8]) -> Result<Vec<u8>, ConvertError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    struct StubTracer;

    #[async_trait]
    impl VectorTracer for StubTracer {
        async fn trace(
            &self,
            _image: &[u8],
            _mode: ColorMode,
        ) -> Result<VectorDocument, ConvertError> {
            Ok(VectorDocument {
                width: 4,
                height: 4,
                layers: vec![ColorLayer {
                    color: [0, 0, 0],
                    runs: vec![Run { x: 0, y: 0, len: 4 }],
                }],
            })
        }
    }

    struct ComplexityTracer;

    #[async_trait]
    impl VectorTracer for ComplexityTracer {
        async fn trace(
            &self,
            _image: &[u8],
            _mode: ColorMode,
        ) -> Result<VectorDocument, ConvertError> {
            Err(ConvertError::TooComplex("647 distinct colors".into()))
        }
    }

    struct StubRenderer;

    #[async_trait]
    impl FormatRenderer for StubRenderer {
        async fn render(
            &self,
            _doc: &VectorDocument,
            format: OutputFormat,
        ) -> Result<Vec<u8>, ConvertError> {
            Ok(format!("artifact:{}", format.name()).into_bytes())
        }
    }

    /// Store wrapper recording every progress commit, in order.
    struct RecordingStore {
        inner: MemoryJobStore,
        updates: Mutex<Vec<(u8, String)>>,
    }

    #[async_trait]
    impl JobStore for RecordingStore {
        async fn create(&self, original: OriginalInfo) -> govector_core::job::Job {
            self.inner.create(original).await
        }
        async fn get(&self, id: JobId) -> Result<govector_core::job::Job, ConvertError> {
            self.inner.get(id).await
        }
        async fn update(&self, id: JobId, progress: u8, stage: &str) -> Result<(), ConvertError> {
            self.updates
                .lock()
                .unwrap()
                .push((progress, stage.to_string()));
            self.inner.update(id, progress, stage).await
        }
        async fn mark_completed(
            &self,
            id: JobId,
            artifacts: BTreeMap<OutputFormat, String>,
            secs: f64,
        ) -> Result<govector_core::job::Job, ConvertError> {
            self.inner.mark_completed(id, artifacts, secs).await
        }
        async fn mark_failed(
            &self,
            id: JobId,
            error: &ConvertError,
        ) -> Result<govector_core::job::Job, ConvertError> {
            self.inner.mark_failed(id, error).await
        }
    }

    // -- Harness -------------------------------------------------------------

    /// Minimal original: PNG signature plus padding, enough for the
    /// validate stage's magic-byte check.
    fn fake_png() -> Vec<u8> {
        let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
        v.resize(64, 0);
        v
    }

    struct Harness {
        _dir: tempfile::TempDir,
        store: Arc<RecordingStore>,
        files: Arc<FileStore>,
    }

    async fn harness() -> (Harness, JobId) {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FileStore::new(dir.path()));
        let store = Arc::new(RecordingStore {
            inner: MemoryJobStore::new(),
            updates: Mutex::new(Vec::new()),
        });
        let job = store
            .create(OriginalInfo {
                format: ImageFormat::Png,
                size_bytes: 64,
                stored_as: "original.png".into(),
            })
            .await;
        files.put(job.id, "original.png", &fake_png()).await.unwrap();
        (
            Harness {
                _dir: dir,
                store,
                files,
            },
            job.id,
        )
    }

    fn executor(
        h: &Harness,
        remover: Arc<dyn BackgroundRemover>,
        tracer: Arc<dyn VectorTracer>,
        config: PipelineConfig,
    ) -> PipelineExecutor {
        PipelineExecutor::new(
            h.store.clone(),
            h.files.clone(),
            remover,
            tracer,
            Arc::new(StubRenderer),
            config,
        )
    }

    // -- Tests ---------------------------------------------------------------

    #[tokio::test]
    async fn successful_run_walks_the_bands_and_completes() {
        let (h, id) = harness().await;
        executor(
            &h,
            Arc::new(PassthroughRemover),
            Arc::new(StubTracer),
            PipelineConfig::default(),
        )
        .run(id)
        .await;

        let job = h.store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.artifacts.len(), 3);
        assert!(job.processing_time_seconds.is_some());

        // Band boundaries committed in order: 0,10,10,40,40,80,80,100.
        let progresses: Vec<u8> = h
            .store
            .updates
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| *p)
            .collect();
        assert_eq!(progresses, vec![0, 10, 10, 40, 40, 80, 80, 100]);
        assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn artifacts_are_retrievable_after_completion() {
        let (h, id) = harness().await;
        executor(
            &h,
            Arc::new(PassthroughRemover),
            Arc::new(StubTracer),
            PipelineConfig::default(),
        )
        .run(id)
        .await;

        for format in OUTPUT_FORMATS {
            let bytes = h.files.get(id, format.filename()).await.unwrap();
            assert_eq!(bytes, format!("artifact:{}", format.name()).into_bytes());
        }
    }

    #[tokio::test]
    async fn too_complex_fails_the_job_without_retry() {
        let (h, id) = harness().await;
        executor(
            &h,
            Arc::new(PassthroughRemover),
            Arc::new(ComplexityTracer),
            PipelineConfig::default(),
        )
        .run(id)
        .await;

        let job = h.store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("TOO_COMPLEX"));
        assert_eq!(job.retry_allowed, Some(false));
        // The pipeline halted before rendering anything.
        assert!(!h.files.exists(id, "output.svg").await);
        // Progress stopped inside the vectorize band.
        assert_eq!(h.store.updates.lock().unwrap().last().unwrap().0, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn global_deadline_forces_timeout_failure() {
        let (h, id) = harness().await;
        executor(
            &h,
            Arc::new(StuckRemover),
            Arc::new(StubTracer),
            PipelineConfig {
                stage_timeout: Duration::from_secs(3600),
                deadline: Duration::from_secs(30),
                color_mode: ColorMode::Color,
            },
        )
        .run(id)
        .await;

        let job = h.store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("TIMEOUT"));
        assert_eq!(job.retry_allowed, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn stage_timeout_maps_to_the_stage_failure_code() {
        let (h, id) = harness().await;
        executor(
            &h,
            Arc::new(StuckRemover),
            Arc::new(StubTracer),
            PipelineConfig {
                stage_timeout: Duration::from_secs(5),
                deadline: Duration::from_secs(3600),
                color_mode: ColorMode::Color,
            },
        )
        .run(id)
        .await;

        let job = h.store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_code.as_deref(), Some("BACKGROUND_REMOVAL_FAILED"));
        assert!(job.error_message.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn missing_original_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FileStore::new(dir.path()));
        let store = Arc::new(RecordingStore {
            inner: MemoryJobStore::new(),
            updates: Mutex::new(Vec::new()),
        });
        // Job exists but its original was never stored.
        let job = store
            .create(OriginalInfo {
                format: ImageFormat::Png,
                size_bytes: 64,
                stored_as: "original.png".into(),
            })
            .await;
        let h = Harness {
            _dir: dir,
            store,
            files,
        };

        executor(
            &h,
            Arc::new(PassthroughRemover),
            Arc::new(StubTracer),
            PipelineConfig::default(),
        )
        .run(job.id)
        .await;

        let failed = h.store.get(job.id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error_code.as_deref(), Some("PROCESSING_FAILED"));
    }

    #[tokio::test]
    async fn internal_errors_never_leak_into_the_job_record() {
        assert_matches!(
            sanitize(ConvertError::Internal("lock poisoned at store.rs:42".into())),
            ConvertError::ProcessingFailed(msg) if !msg.contains("store.rs")
        );
        assert_matches!(
            sanitize(ConvertError::TooComplex("x".into())),
            ConvertError::TooComplex(_)
        );
    }
}
