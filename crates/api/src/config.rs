//! Configuration loaded from environment variables.

use std::time::Duration;

use govector_engines::ColorMode;
use govector_pipeline::PipelineConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Conversion-side configuration: upload ceiling, storage root, worker
/// count, pipeline time bounds.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Upload size ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Root directory for stored originals and artifacts.
    pub storage_dir: String,
    /// Number of concurrent pipeline workers.
    pub worker_count: usize,
    /// Ceiling for a single pipeline stage, in seconds.
    pub stage_timeout_secs: u64,
    /// Hard ceiling for a whole job, in seconds.
    pub pipeline_deadline_secs: u64,
    /// Whether the tracer preserves color or thresholds to black/white.
    pub color_mode: ColorMode,
}

impl ProcessingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default   |
    /// |--------------------------|-----------|
    /// | `MAX_UPLOAD_MB`          | `10`      |
    /// | `STORAGE_DIR`            | `storage` |
    /// | `WORKER_COUNT`           | `2`       |
    /// | `STAGE_TIMEOUT_SECS`     | `20`      |
    /// | `PIPELINE_DEADLINE_SECS` | `30`      |
    /// | `COLOR_MODE`             | `color`   |
    pub fn from_env() -> Self {
        let max_upload_mb: u64 = std::env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("MAX_UPLOAD_MB must be a valid u64");

        let storage_dir = std::env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".into());

        let worker_count: usize = std::env::var("WORKER_COUNT")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("WORKER_COUNT must be a valid usize");

        let stage_timeout_secs: u64 = std::env::var("STAGE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("STAGE_TIMEOUT_SECS must be a valid u64");

        let pipeline_deadline_secs: u64 = std::env::var("PIPELINE_DEADLINE_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PIPELINE_DEADLINE_SECS must be a valid u64");

        let color_mode = match std::env::var("COLOR_MODE").as_deref() {
            Ok("mono") => ColorMode::Mono,
            _ => ColorMode::Color,
        };

        Self {
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            storage_dir,
            worker_count,
            stage_timeout_secs,
            pipeline_deadline_secs,
            color_mode,
        }
    }

    /// Time bounds and color mode in the shape the pipeline takes.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            stage_timeout: Duration::from_secs(self.stage_timeout_secs),
            deadline: Duration::from_secs(self.pipeline_deadline_secs),
            color_mode: self.color_mode,
        }
    }
}
