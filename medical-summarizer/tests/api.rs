use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use httpmock::prelude::*;
use medical_summarizer::{
    AppConfig, AppState, build_router,
    audit::AuditLog,
    client::ChatCompletionsClient,
    config::ProviderConfig,
    error::ProviderErrorKind,
    feedback::FeedbackStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    server: MockServer,
    notes: TempDir,
    logs: TempDir,
    feedback: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let server = MockServer::start_async().await;
        let notes = tempfile::tempdir().unwrap();
        let logs = tempfile::tempdir().unwrap();
        let feedback = tempfile::tempdir().unwrap();

        let mut provider = ProviderConfig::new("sk-test");
        provider.base_url = server.url("/v1");
        provider.timeout = Duration::from_secs(5);

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            notes_dir: notes.path().to_path_buf(),
            log_dir: logs.path().to_path_buf(),
            feedback_dir: feedback.path().to_path_buf(),
            min_note_chars: 10,
            provider: provider.clone(),
        };
        let client = ChatCompletionsClient::new(provider).unwrap();
        let router = build_router(AppState::new(&config, Arc::new(client)));

        Self {
            router,
            server,
            notes,
            logs,
            feedback,
        }
    }

    fn write_note(&self, name: &str, text: &str) {
        std::fs::write(self.notes.path().join(name), text).unwrap();
    }

    async fn reply_with(&self, content: &str) {
        let content = content.to_string();
        self.server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "model": "gpt-4o",
                    "choices": [{ "message": { "role": "assistant", "content": content } }],
                    "usage": { "prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150 }
                }));
            })
            .await;
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn summarize_body(&self, highlight_critical: bool) -> Value {
        json!({
            "directory": self.notes.path().to_string_lossy(),
            "role": "physician",
            "format": "brief",
            "highlight_critical": highlight_critical
        })
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["POST /summarize"].is_string());
}

#[tokio::test]
async fn summarize_returns_one_record_per_note() {
    let app = TestApp::new().await;
    app.write_note("note1.txt", "Sample medical note for testing.");
    app.write_note("note2.txt", "Sample medical note for testing.");
    app.reply_with("Test summary. Critical Findings Finding 1").await;

    let (status, body) = app.post("/summarize", app.summarize_body(true)).await;

    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert!(record["summary_id"].as_str().unwrap().starts_with("sum_"));
        assert!(record["file_name"].as_str().unwrap().ends_with(".txt"));
        assert_eq!(record["status"], "completed");
        assert_eq!(record["summary"], "Test summary.");
        assert_eq!(record["critical_findings"], json!(["Finding 1"]));
        assert_eq!(record["metadata"]["role"], "physician");
        assert_eq!(record["metadata"]["format"], "brief");
        assert_eq!(record["metadata"]["tokens"]["total_tokens"], 150);
    }
    assert_ne!(records[0]["summary_id"], records[1]["summary_id"]);

    let entries = AuditLog::new(app.logs.path()).entries().await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn summarize_without_highlighting_has_no_findings() {
    let app = TestApp::new().await;
    app.write_note("note1.txt", "Sample medical note for testing.");
    app.reply_with("SUMMARY: Test summary. Critical Findings Finding 1").await;

    let (status, body) = app.post("/summarize", app.summarize_body(false)).await;

    assert_eq!(status, StatusCode::OK);
    let record = &body.as_array().unwrap()[0];
    assert!(record.get("critical_findings").is_none());
}

#[tokio::test]
async fn summarize_missing_directory_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/summarize",
            json!({ "directory": "nonexistent_directory", "role": "physician", "format": "brief" }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Directory not found");
}

#[tokio::test]
async fn summarize_empty_directory_is_empty_array() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/summarize", app.summarize_body(true)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn summarize_blank_directory_is_bad_request() {
    let app = TestApp::new().await;

    let (status, _) = app.post("/summarize", json!({ "directory": "  " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summarize_rejects_malformed_body() {
    let app = TestApp::new().await;

    let (status, _) = app.post("/summarize", json!({ "role": "nurse" })).await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn provider_failure_for_every_note_is_bad_gateway() {
    let app = TestApp::new().await;
    app.write_note("note1.txt", "Sample medical note for testing.");
    app.server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid api key");
        })
        .await;

    let (status, body) = app.post("/summarize", app.summarize_body(true)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("authentication"));
}

#[tokio::test]
async fn failed_note_reports_the_provider_error_kind() {
    let app = TestApp::new().await;
    app.write_note("a.txt", "Routine follow-up, wound healing well.");
    app.write_note("b.txt", "Overnight deterioration, transferred to ICU.");
    app.server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Overnight deterioration");
            then.status(429).body("slow down");
        })
        .await;
    app.server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Routine follow-up");
            then.status(200).json_body(json!({
                "model": "gpt-4o",
                "choices": [{ "message": { "role": "assistant", "content": "SUMMARY: Healing well." } }]
            }));
        })
        .await;

    let (status, body) = app.post("/summarize", app.summarize_body(true)).await;

    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records[0]["status"], "completed");
    assert!(records[0].get("error_kind").is_none());
    assert_eq!(records[1]["status"], "failed");
    assert_eq!(records[1]["error"], "rate limited by the provider");
    assert_eq!(records[1]["error_kind"], "rate_limited");

    let entries = AuditLog::new(app.logs.path()).entries().await.unwrap();
    let kinds: Vec<Option<ProviderErrorKind>> = entries.iter().map(|e| e.error_kind).collect();
    assert_eq!(kinds, vec![None, Some(ProviderErrorKind::RateLimited)]);
}

#[tokio::test]
async fn feedback_is_acknowledged_and_stored_verbatim() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/feedback",
            json!({ "summary_id": "test_id_123", "rating": 4, "comments": "Good summary" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "feedback received");
    assert!(body["feedback_id"].as_str().unwrap().starts_with("fb_"));

    let entries = FeedbackStore::new(app.feedback.path()).entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].summary_id, "test_id_123");
    assert_eq!(entries[0].rating, 4);
    assert_eq!(entries[0].comments.as_deref(), Some("Good summary"));
}

#[tokio::test]
async fn feedback_rating_out_of_range_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/feedback", json!({ "summary_id": "sum_1", "rating": 9 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("rating"));

    let entries = FeedbackStore::new(app.feedback.path()).entries().await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn feedback_storage_failure_is_server_error() {
    let app = TestApp::new().await;
    // Occupy the feedback file path with a directory so the append fails.
    std::fs::create_dir(app.feedback.path().join("feedback.jsonl")).unwrap();

    let (status, body) = app
        .post("/feedback", json!({ "summary_id": "sum_1", "rating": 3 }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to store feedback");
}
