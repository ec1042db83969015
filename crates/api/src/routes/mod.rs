pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the conversion route tree (mounted at the root):
///
/// ```text
/// POST /upload                       accept an image, queue a job
/// GET  /status/{job_id}              progress snapshot
/// GET  /result/{job_id}              artifact links once completed
/// GET  /files/{job_id}/{filename}    download a stored file
/// POST /email                        mail an artifact
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handlers::upload::upload_image))
        .route("/status/{job_id}", get(handlers::status::job_status))
        .route("/result/{job_id}", get(handlers::status::job_result))
        .route("/files/{job_id}/{filename}", get(handlers::files::download))
        .route("/email", post(handlers::email::send_artifact))
}
