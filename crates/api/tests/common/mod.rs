#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use govector_api::config::{ProcessingConfig, ServerConfig};
use govector_api::router::build_app_router;
use govector_api::state::AppState;
use govector_engines::background::FlattenBackgroundRemover;
use govector_engines::render::PrintRenderer;
use govector_engines::trace::QuantizingTracer;
use govector_engines::ColorMode;
use govector_pipeline::{JobQueue, PipelineExecutor, WorkerPool};
use govector_store::{FileStore, MemoryJobStore};

/// A fully wired application over temp-directory storage, with live
/// workers running the real engines.
pub struct TestApp {
    pub app: Router,
    pub jobs: Arc<MemoryJobStore>,
    pub files: Arc<FileStore>,
    pub pool: WorkerPool,
    // Keeps the queue channel open after `pool.shutdown()`, so tests
    // can upload against a stopped pool and observe jobs stay queued.
    _rx: async_channel::Receiver<govector_core::types::JobId>,
    _dir: tempfile::TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application with all middleware layers, mirroring the
/// wiring in `main.rs` so integration tests exercise the same stack
/// (CORS, request ID, timeout, tracing, panic recovery) that production
/// uses. Email delivery is left unconfigured.
pub fn build_test_app() -> TestApp {
    build_test_app_with_limit(10 * 1024 * 1024)
}

/// Same as [`build_test_app`] but with a caller-chosen upload ceiling,
/// so size-rejection tests do not need multi-megabyte bodies.
pub fn build_test_app_with_limit(max_upload_bytes: u64) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config();
    let processing = ProcessingConfig {
        max_upload_bytes,
        storage_dir: dir.path().to_string_lossy().into_owned(),
        worker_count: 2,
        stage_timeout_secs: 20,
        pipeline_deadline_secs: 30,
        color_mode: ColorMode::Color,
    };

    let jobs = Arc::new(MemoryJobStore::new());
    let files = Arc::new(FileStore::new(dir.path()));

    let executor = Arc::new(PipelineExecutor::new(
        jobs.clone(),
        files.clone(),
        Arc::new(FlattenBackgroundRemover::default()),
        Arc::new(QuantizingTracer::default()),
        Arc::new(PrintRenderer),
        processing.pipeline(),
    ));
    let (queue, rx) = JobQueue::new();
    let pool = WorkerPool::spawn(executor, rx.clone(), processing.worker_count);

    let state = AppState {
        jobs: jobs.clone(),
        files: files.clone(),
        queue,
        config: Arc::new(config.clone()),
        processing: Arc::new(processing),
        mailer: None,
    };

    TestApp {
        app: build_app_router(state, &config),
        jobs,
        files,
        pool,
        _rx: rx,
        _dir: dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST a single file as a `multipart/form-data` body with one `file`
/// field, the way a browser form submits an upload.
pub async fn post_file(app: Router, uri: &str, filename: &str, bytes: &[u8]) -> Response<Body> {
    const BOUNDARY: &str = "x-test-boundary-7d93a1";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&bytes))
    })
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    use http_body_util::BodyExt;
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Encode a small two-color logo as a real PNG: black circle on a white
/// field. Simple enough for the reference engines to vectorize quickly.
pub fn png_logo() -> Vec<u8> {
    let size = 32u32;
    let image = image::RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as i32 - 16;
        let dy = y as i32 - 16;
        if dx * dx + dy * dy <= 8 * 8 {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encode test PNG");
    bytes
}

/// Poll `/status/{id}` until the job reaches a terminal state,
/// recording every observed progress value.
pub async fn poll_to_terminal(app: &Router, job_id: &str) -> (serde_json::Value, Vec<u64>) {
    let mut observed = Vec::new();
    for _ in 0..400 {
        let response = get(app.clone(), &format!("/status/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        observed.push(json["progress"].as_u64().unwrap());
        match json["status"].as_str().unwrap() {
            "completed" | "failed" => return (json, observed),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("job {job_id} never reached a terminal state");
}
