//! Integration tests for status, result, and file access ordering.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_file};

// ---------------------------------------------------------------------------
// Test: unknown job id returns 404 JOB_NOT_FOUND
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_for_unknown_job_is_not_found() {
    let test = common::build_test_app();
    let response = get(
        test.app.clone(),
        &format!("/status/{}", uuid::Uuid::new_v4()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "JOB_NOT_FOUND");
    test.pool.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: malformed job id is rejected, not treated as a lookup miss
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_job_id_is_a_bad_request() {
    let test = common::build_test_app();
    let response = get(test.app.clone(), "/status/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    test.pool.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: files are withheld until the job completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn files_are_withheld_before_completion() {
    // No workers pull from this pool after shutdown, so the job stays
    // queued and its files must not be served.
    let test = common::build_test_app();
    test.pool.shutdown().await;

    let response = post_file(test.app.clone(), "/upload", "logo.png", &common::png_logo()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    for filename in ["output.svg", "original.png"] {
        let response = get(test.app.clone(), &format!("/files/{job_id}/{filename}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{filename}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "FILE_NOT_FOUND");
    }
}

// ---------------------------------------------------------------------------
// Test: result for a queued job reports pending rather than an error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn result_for_queued_job_is_pending() {
    let test = common::build_test_app();
    test.pool.shutdown().await;

    let response = post_file(test.app.clone(), "/upload", "logo.png", &common::png_logo()).await;
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get(test.app.clone(), &format!("/result/{job_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "queued");
    assert!(json["message"].as_str().unwrap().contains("processing"));
}

// ---------------------------------------------------------------------------
// Test: a fresh upload polls as queued at progress zero
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_upload_polls_as_queued() {
    let test = common::build_test_app();
    test.pool.shutdown().await;

    let response = post_file(test.app.clone(), "/upload", "logo.png", &common::png_logo()).await;
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get(test.app.clone(), &format!("/status/{job_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "queued");
    assert_eq!(json["progress"], 0);
    assert_eq!(json["stage"], "Queued for processing");
    assert!(json["created_at"].is_string());
    assert!(json.get("error_code").is_none());
}
