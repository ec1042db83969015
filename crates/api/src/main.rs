use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use govector_api::config::{ProcessingConfig, ServerConfig};
use govector_api::router::build_app_router;
use govector_api::state::AppState;
use govector_delivery::{EmailConfig, EmailDelivery};
use govector_engines::background::FlattenBackgroundRemover;
use govector_engines::render::PrintRenderer;
use govector_engines::trace::QuantizingTracer;
use govector_pipeline::{JobQueue, PipelineExecutor, WorkerPool};
use govector_store::{FileStore, MemoryJobStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "govector_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let processing = ProcessingConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage_dir = %processing.storage_dir,
        workers = processing.worker_count,
        "Loaded configuration"
    );

    // --- Stores ---
    let jobs = Arc::new(MemoryJobStore::new());
    let files = Arc::new(FileStore::new(&processing.storage_dir));

    // --- Engines ---
    let executor = Arc::new(PipelineExecutor::new(
        jobs.clone(),
        files.clone(),
        Arc::new(FlattenBackgroundRemover::default()),
        Arc::new(QuantizingTracer::default()),
        Arc::new(PrintRenderer),
        processing.pipeline(),
    ));

    // --- Worker pool ---
    let (queue, rx) = JobQueue::new();
    let pool = WorkerPool::spawn(executor, rx, processing.worker_count);
    tracing::info!(workers = processing.worker_count, "Worker pool started");

    // --- Email delivery (optional) ---
    let mailer = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!(smtp_host = %email_config.smtp_host, "Email delivery enabled");
            Some(Arc::new(EmailDelivery::new(email_config)))
        }
        None => {
            tracing::info!("SMTP_HOST not set, email delivery disabled");
            None
        }
    };

    // --- App state and router ---
    let state = AppState {
        jobs,
        files,
        queue,
        config: Arc::new(config.clone()),
        processing: Arc::new(processing),
        mailer,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining workers");
    pool.shutdown().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
