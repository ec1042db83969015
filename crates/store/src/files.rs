//! File Publisher: stores originals and rendered artifacts on the local
//! filesystem, addressed by `(job_id, filename)`.
//!
//! Layout mirrors one directory per job under the configured root:
//!
//! ```text
//! storage/jobs/{job_id}/original.png
//! storage/jobs/{job_id}/output.svg
//! storage/jobs/{job_id}/output.eps
//! storage/jobs/{job_id}/output.pdf
//! ```
//!
//! Published files are immutable: `put` refuses to overwrite.

use std::path::{Path, PathBuf};

use govector_core::error::ConvertError;
use govector_core::types::JobId;

/// Local-filesystem file store.
#[derive(Debug, Clone)]
pub struct FileStore {
    jobs_root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base`. The `jobs/` subdirectory is
    /// created on first write.
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            jobs_root: base.as_ref().join("jobs"),
        }
    }

    fn job_dir(&self, job_id: JobId) -> PathBuf {
        self.jobs_root.join(job_id.to_string())
    }

    fn file_path(&self, job_id: JobId, filename: &str) -> Result<PathBuf, ConvertError> {
        // Filenames are fixed constants internally, but the download
        // endpoint passes client input through here.
        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return Err(ConvertError::FileNotFound {
                filename: filename.to_string(),
            });
        }
        Ok(self.job_dir(job_id).join(filename))
    }

    /// Store a file for a job. Fails if the name is already published.
    pub async fn put(
        &self,
        job_id: JobId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), ConvertError> {
        let path = self.file_path(job_id, filename)?;
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ConvertError::Internal(format!("create {}: {e}", dir.display())))?;

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ConvertError::Internal(format!(
                "artifact {filename} already published for job {job_id}"
            )));
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ConvertError::Internal(format!("write {}: {e}", path.display())))?;
        tracing::debug!(job_id = %job_id, filename, size = bytes.len(), "File published");
        Ok(())
    }

    /// Read a stored file's bytes.
    pub async fn get(&self, job_id: JobId, filename: &str) -> Result<Vec<u8>, ConvertError> {
        let path = self.file_path(job_id, filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConvertError::FileNotFound {
                filename: filename.to_string(),
            }),
            Err(e) => Err(ConvertError::Internal(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Whether a file exists for the job.
    pub async fn exists(&self, job_id: JobId, filename: &str) -> bool {
        match self.file_path(job_id, filename) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Content type for a stored filename, by extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("svg") => "image/svg+xml",
        Some("eps") => "application/postscript",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
