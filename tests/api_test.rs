//! HTTP API tests against in-memory providers

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----knowledge-explorer-test";

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_query(body: &Value) -> Request<Body> {
    Request::post("/api/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(files: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (filename, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Split an SSE body into `(event, data)` pairs
fn parse_sse(body: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(body)
        .split("\n\n")
        .filter_map(|frame| {
            let mut event = None;
            let mut data = None;
            for line in frame.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = Some(v.trim().to_string());
                } else if let Some(v) = line.strip_prefix("data:") {
                    data = Some(v.trim().to_string());
                }
            }
            Some((event?, data.unwrap_or_default()))
        })
        .collect()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = common::test_app();

    let (status, body) = send_json(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");

    let (status, body) = send_json(&app.router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");

    let (status, body) = send_json(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["api_keys"]["groq"], false);
    assert_eq!(body["data"]["config"]["vector_store"], "memory");
    assert_eq!(body["data"]["config"]["embedding_dimension"], common::DIM);
}

#[tokio::test]
async fn test_process_time_header() {
    let app = common::test_app();
    let response = app.router.clone().oneshot(get("/api/health")).await.unwrap();
    let value = response
        .headers()
        .get("x-process-time")
        .expect("process time header")
        .to_str()
        .unwrap();
    assert!(value.parse::<f64>().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_upload_then_query_returns_document_answer() {
    let app = common::test_app();

    let (status, body) = send_json(
        &app.router,
        upload(&[("tower.txt", "The Eiffel Tower was built in 1889.")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["files"][0]["filename"], "tower.txt");
    assert_eq!(body["data"]["files"][0]["chunks"], 1);
    assert!(app.upload_dir.path().join("tower.txt").exists());

    let (status, body) = send_json(
        &app.router,
        post_query(&json!({ "question": "When was the Eiffel Tower built?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["metadata"]["mode"], "documents");
    assert_eq!(data["metadata"]["retrieved_docs"], 1);
    assert!(data["answer"].as_str().unwrap().contains("1889"));
    assert!(data["answer"]
        .as_str()
        .unwrap()
        .ends_with("Source: tower.txt"));
    assert_eq!(data["sources"][0]["filename"], "tower.txt");
}

#[tokio::test]
async fn test_upload_status_lists_saved_files() {
    let app = common::test_app();
    send(&app.router, upload(&[("notes.txt", "Quarterly revenue grew.")])).await;

    let (status, body) = send_json(&app.router, get("/api/upload/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["file_count"], 1);
    assert_eq!(body["data"]["files"][0]["filename"], "notes.txt");
}

#[tokio::test]
async fn test_upload_rejects_unsupported_file() {
    let app = common::test_app();

    let (status, body) = send_json(&app.router, upload(&[("image.png", "not text")])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["files"][0]["status"], "error");
    assert!(body["data"]["files"][0]["message"]
        .as_str()
        .unwrap()
        .contains(".png"));
    assert_eq!(app.explorer.stats().await.unwrap().total_vectors, 0);
}

#[tokio::test]
async fn test_upload_mixed_files_succeeds_partially() {
    let app = common::test_app();

    let (status, body) = send_json(
        &app.router,
        upload(&[("a.txt", "Alpha content here."), ("b.exe", "binary")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["files"][0]["status"], "success");
    assert_eq!(body["data"]["files"][1]["status"], "error");
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let app = common::test_app();
    let (status, body) = send_json(&app.router, upload(&[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("No files"));
}

#[tokio::test]
async fn test_query_validation() {
    let app = common::test_app();

    let (status, body) = send_json(&app.router, post_query(&json!({ "question": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send_json(
        &app.router,
        post_query(&json!({ "question": "hi", "top_k": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_document_question_without_uploads_is_refused() {
    let app = common::test_app();

    let (status, body) = send_json(
        &app.router,
        post_query(&json!({ "question": "Summarize the uploaded report" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["mode"], "no_relevant_documents");
    assert_eq!(body["data"]["sources"], json!([]));
}

#[tokio::test]
async fn test_general_question_uses_general_knowledge() {
    let app = common::test_app();

    let (_, body) = send_json(
        &app.router,
        post_query(&json!({ "question": "What is the capital of France?" })),
    )
    .await;
    assert_eq!(body["data"]["metadata"]["mode"], "general");
    assert_eq!(
        body["data"]["answer"],
        "I can answer that from general knowledge."
    );
}

#[tokio::test]
async fn test_stream_query_event_order() {
    let app = common::test_app();
    send(
        &app.router,
        upload(&[("tower.txt", "The Eiffel Tower was built in 1889.")]),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(get(
            "/api/stream-query?question=When%20was%20the%20Eiffel%20Tower%20built%3F",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let events = parse_sse(&body);

    assert_eq!(events.first().unwrap().0, "metadata");
    let metadata: Value = serde_json::from_str(&events[0].1).unwrap();
    assert_eq!(metadata["mode"], "documents");
    assert_eq!(metadata["sources"][0]["filename"], "tower.txt");

    let (last_event, last_data) = events.last().unwrap();
    assert_eq!(last_event, "done");
    let done: Value = serde_json::from_str(last_data).unwrap();
    assert!(done["answer"].as_str().unwrap().contains("1889"));

    let tokens: Vec<String> = events[1..events.len() - 1]
        .iter()
        .map(|(event, data)| {
            assert_eq!(event, "message");
            serde_json::from_str::<String>(data).unwrap()
        })
        .collect();
    assert_eq!(done["token_count"], tokens.len());
    assert_eq!(tokens.concat(), done["answer"].as_str().unwrap());
}

#[tokio::test]
async fn test_stream_query_rejects_empty_question() {
    let app = common::test_app();
    let (status, body) = send_json(&app.router, get("/api/stream-query?question=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_stats_delete_and_clear() {
    let app = common::test_app();
    send(
        &app.router,
        upload(&[
            ("tower.txt", "The Eiffel Tower was built in 1889."),
            ("bridge.txt", "The Golden Gate Bridge opened in 1937."),
        ]),
    )
    .await;

    let (status, body) = send_json(&app.router, get("/api/documents/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_vectors"], 2);
    assert_eq!(body["data"]["dimension"], common::DIM);

    let (status, body) =
        send_json(&app.router, delete("/api/documents/filename/tower.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["filename"], "tower.txt");
    assert_eq!(body["data"]["deleted_vectors"], 1);
    assert_eq!(app.explorer.stats().await.unwrap().total_vectors, 1);

    let (status, body) = send_json(&app.router, delete("/api/documents/clear-all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.explorer.stats().await.unwrap().total_vectors, 0);
}

#[tokio::test]
async fn test_query_with_missing_question_uses_envelope() {
    let app = common::test_app();

    let (status, body) = send_json(&app.router, post_query(&json!({ "top_k": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("question"));

    let request = Request::post("/api/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_stream_query_without_params_uses_envelope() {
    let app = common::test_app();
    let (status, body) = send_json(&app.router, get("/api/stream-query")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn test_upload_without_multipart_uses_envelope() {
    let app = common::test_app();
    let request = Request::post("/api/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_over_request_limit_is_payload_too_large() {
    let app = common::test_app_with(Arc::new(common::ContextEchoModel), |config| {
        config.ingest.max_request_size = 1024;
    });
    let big = "word ".repeat(1000);

    let (status, body) = send_json(&app.router, upload(&[("big.txt", &big)])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("1024"));
}

#[tokio::test]
async fn test_reupload_replaces_previous_chunks() {
    let app = common::test_app();
    let file = [("tower.txt", "The Eiffel Tower was built in 1889.")];

    send(&app.router, upload(&file)).await;
    send(&app.router, upload(&file)).await;
    assert_eq!(app.explorer.stats().await.unwrap().total_vectors, 1);

    let (_, body) = send_json(
        &app.router,
        post_query(&json!({ "question": "When was the Eiffel Tower built?" })),
    )
    .await;
    assert_eq!(body["data"]["sources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stream_failure_emits_error_event_without_done() {
    let app = common::test_app_with(Arc::new(common::CutOffModel), |_| {});

    let (status, body) = send(
        &app.router,
        get("/api/stream-query?question=What%20is%20the%20capital%20of%20France%3F"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let events = parse_sse(&body);
    let names: Vec<&str> = events.iter().map(|(event, _)| event.as_str()).collect();
    assert_eq!(names, ["metadata", "message", "message", "error"]);

    let error: Value = serde_json::from_str(&events[3].1).unwrap();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains(common::CUT_OFF_MESSAGE));
}
