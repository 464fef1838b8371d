use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use rilevo::config::Config;
use rilevo::db::{MemoryJobStore, SharedJobStore};
use rilevo::services::classifier::{SharedClassifier, SignatureClassifier};
use rilevo::services::queue::{JobRepository, Worker, WorkerSettings};

const BOUNDARY: &str = "rilevo-test-boundary";

struct TestApp {
    router: Router,
    worker: Worker,
}

fn test_app() -> TestApp {
    let config = Config::default();
    let store: SharedJobStore = Arc::new(MemoryJobStore::new());
    let classifier: SharedClassifier = Arc::new(SignatureClassifier::load().unwrap());
    let repository = JobRepository::new(store, Duration::from_secs(3600), Duration::from_secs(600));

    let worker = Worker::new(
        repository.clone(),
        classifier.clone(),
        WorkerSettings::from(&config),
    );

    TestApp {
        router: rilevo::routes::create_router(repository, classifier, &config),
        worker,
    }
}

fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn submit(router: &Router, file_name: &str, data: &[u8]) -> String {
    let (status, body) = send(
        router,
        upload_request("/api/jobs", multipart_body("file", Some(file_name), data)),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    body["jobId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_submit_job_returns_accepted() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        upload_request("/api/jobs", multipart_body("file", Some("test.pdf"), b"%PDF-1.4")),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(!body["jobId"].as_str().unwrap().is_empty());
    assert_eq!(body["message"], "Job inviato");
}

#[tokio::test]
async fn test_job_lifecycle_over_http() {
    let app = test_app();
    let job_id = submit(&app.router, "test.pdf", b"%PDF-1.7\nbody").await;

    let uri = format!("/api/jobs/{}/status", job_id);
    let (status, body) = send(&app.router, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobId"], job_id.as_str());
    assert_eq!(body["status"], "pending");
    assert!(body["createdAt"].is_string());
    assert!(body.get("error").is_none());

    let uri = format!("/api/jobs/{}/result", job_id);
    let (status, body) = send(&app.router, get_request(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    assert!(app.worker.process_next_job().await.unwrap());

    let uri = format!("/api/jobs/{}/status", job_id);
    let (status, body) = send(&app.router, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let uri = format!("/api/jobs/{}/result", job_id);
    let (status, body) = send(&app.router, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileName"], "test.pdf");
    assert_eq!(body["fileType"], "pdf");
    assert_eq!(body["scorePercent"], "99%");
    assert_eq!(body["mimeType"], "application/pdf");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = test_app();

    let (status, body) = send(&app.router, get_request("/api/jobs/non-esiste/status")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("non-esiste"));

    let (status, _) = send(&app.router, get_request("/api/jobs/non-esiste/result")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_file_is_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        upload_request("/api/jobs", multipart_body("note", None, b"ciao")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_file_name_is_sanitized() {
    let app = test_app();
    let job_id = submit(&app.router, "../../etc/report.pdf", b"%PDF-1.4").await;
    app.worker.process_next_job().await.unwrap();

    let uri = format!("/api/jobs/{}/result", job_id);
    let (_, body) = send(&app.router, get_request(&uri)).await;
    assert_eq!(body["fileName"], "report.pdf");
}

#[tokio::test]
async fn test_detect_file_type_sync() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        upload_request(
            "/api/detect-file-type",
            multipart_body("file", Some("data.json"), br#"{"a": [1, 2, 3]}"#),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileType"], "json");
    assert_eq!(body["isText"], true);
    assert_eq!(body["fileName"], "data.json");
}

#[tokio::test]
async fn test_health_and_root() {
    let app = test_app();

    let (status, body) = send(&app.router, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "connected");

    let (status, body) = send(&app.router, get_request("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["jobs"]["create"], "/api/jobs");
    assert_eq!(body["endpoints"]["detectFileType"], "/api/detect-file-type");
}
