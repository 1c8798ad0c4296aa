use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use verify_common::generative::{ScriptedModel, ScriptedReply};
use verify_common::{AppConfig, DbPool, Repository};
use verify_gateway::{create_router, handlers::MODE_HEADER, AppState};

const EMAIL: &str = "reader@example.com";
const BOUNDARY: &str = "verify-test-boundary";

struct TestApp {
    router: axum::Router,
    model: Arc<ScriptedModel>,
}

impl TestApp {
    async fn with_config(model: ScriptedModel, config: AppConfig) -> Self {
        let model = Arc::new(model);
        let pool = DbPool::in_memory().await.unwrap();
        let state = AppState::new(config, Repository::new(pool), model.clone());
        Self {
            router: create_router(state),
            model,
        }
    }

    async fn new(model: ScriptedModel) -> Self {
        Self::with_config(model, AppConfig::default()).await
    }

    /// Send a request and return (status, headers, JSON body).
    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, headers, value)
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn post_upload(
        &self,
        uri: &str,
        field: &str,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, filename, mime_type, data)))
            .unwrap();
        self.send(request).await
    }

    async fn history(&self, email: &str) -> Vec<Value> {
        let (status, body) = self.get(&format!("/api/history?email={email}")).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().cloned().unwrap_or_default()
    }
}

/// Form with one file part plus `userEmail`.
fn multipart_body(field: &str, filename: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"userEmail\"\r\n\r\n{EMAIL}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn text_analysis_backfills_human_probability() {
    let app = TestApp::new(ScriptedModel::replying(r#"{"aiProbability": 73, "explanation": "Uniform tone"}"#)).await;

    let (status, headers, body) = app
        .post_json("/api/analyze/text", json!({ "text": "Some prose.", "userEmail": EMAIL }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(MODE_HEADER).is_none());
    assert_eq!(body["aiProbability"], 73.0);
    assert_eq!(body["humanProbability"], 27.0);
    assert_eq!(body["verdict"]["level"], "likely_ai");
    assert_eq!(app.history(EMAIL).await.len(), 1);
}

#[tokio::test]
async fn fenced_output_matches_raw_output() {
    let raw = r#"{"aiProbability": 12, "humanProbability": 88, "confidence": 90}"#;
    let plain = TestApp::new(ScriptedModel::replying(raw)).await;
    let fenced = TestApp::new(ScriptedModel::replying(format!("```json\n{raw}\n```"))).await;

    let request = json!({ "text": "Hello there." });
    let (_, _, a) = plain.post_json("/api/analyze/text", request.clone()).await;
    let (_, _, b) = fenced.post_json("/api/analyze/text", request).await;

    assert_eq!(a, b);
    assert_eq!(a["humanProbability"], 88.0);
}

#[tokio::test]
async fn output_without_json_yields_empty_report() {
    let app = TestApp::new(ScriptedModel::replying("I am unable to analyze this content.")).await;

    let (status, _, body) = app
        .post_json("/api/analyze/text", json!({ "text": "Hello there." }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("aiProbability").is_none());
    assert_eq!(body["verdict"]["level"], "inconclusive");
}

#[tokio::test]
async fn text_highlights_suspicious_sections() {
    let app = TestApp::new(ScriptedModel::replying(
        r#"{"aiProbability": 50, "suspiciousSections": [{"text": "rich tapestry", "reason": "cliche"}]}"#,
    ))
    .await;

    let (_, _, body) = app
        .post_json("/api/analyze/text", json!({ "text": "A rich tapestry of ideas." }))
        .await;

    assert_eq!(body["highlights"][0]["start"], 2);
    assert_eq!(body["highlights"][0]["end"], 15);
    assert_eq!(body["highlights"][0]["reason"], "cliche");
}

#[tokio::test]
async fn rate_limited_model_returns_demo_result() {
    let app = TestApp::new(ScriptedModel::failing(
        Some(429),
        "429 RESOURCE_EXHAUSTED: Quota exceeded",
    ))
    .await;

    let (status, headers, body) = app
        .post_json("/api/analyze/text", json!({ "text": "Some prose.", "userEmail": EMAIL }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(MODE_HEADER).unwrap(), "demo");
    assert!(body["explanation"].as_str().unwrap().contains("Demo Mode"));

    let rows = app.history(EMAIL).await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["result"]["explanation"]
        .as_str()
        .unwrap()
        .contains("Demo Mode"));
}

#[tokio::test]
async fn rate_limit_without_demo_fallback_is_429() {
    let mut config = AppConfig::default();
    config.model.demo_fallback = false;
    let app = TestApp::with_config(ScriptedModel::failing(Some(429), "Too Many Requests"), config).await;

    let (status, _, body) = app
        .post_json("/api/analyze/text", json!({ "text": "Some prose." }))
        .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn upstream_failure_passes_message_through() {
    let app = TestApp::new(ScriptedModel::failing(Some(503), "The model is overloaded")).await;

    let (status, _, body) = app
        .post_json("/api/analyze/link", json!({ "url": "https://example.com/a" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "The model is overloaded");
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn out_of_range_score_is_invalid_output() {
    let app = TestApp::new(ScriptedModel::replying(r#"{"aiProbability": 140}"#)).await;

    let (status, _, body) = app
        .post_json("/api/analyze/text", json!({ "text": "Some prose.", "userEmail": EMAIL }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INVALID_MODEL_OUTPUT");
    assert!(app.history(EMAIL).await.is_empty());
}

#[tokio::test]
async fn history_lists_newest_first() {
    let app = TestApp::new(ScriptedModel::new([
        ScriptedReply::Text(r#"{"aiProbability": 10}"#.into()),
        ScriptedReply::Text(r#"{"aiProbability": 90, "isFake": true}"#.into()),
    ]))
    .await;

    app.post_json("/api/analyze/text", json!({ "text": "First post.", "userEmail": EMAIL }))
        .await;
    app.post_json("/api/analyze/link", json!({ "url": "https://news.example/b", "userEmail": EMAIL }))
        .await;

    let rows = app.history(EMAIL).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "link");
    assert_eq!(rows[0]["content"], "https://news.example/b");
    assert_eq!(rows[0]["result"]["isFake"], true);
    assert_eq!(rows[1]["type"], "text");
    assert_eq!(rows[1]["content"], "First post.");
    assert_eq!(rows[1]["userEmail"], EMAIL);

    assert!(app.history("nobody@example.com").await.is_empty());
}

#[tokio::test]
async fn history_respects_limit_and_requires_email() {
    let app = TestApp::new(ScriptedModel::always(r#"{"aiProbability": 5}"#)).await;
    for i in 0..3 {
        app.post_json("/api/analyze/text", json!({ "text": format!("Post {i}"), "userEmail": EMAIL }))
            .await;
    }

    let (status, body) = app.get(&format!("/api/history?email={EMAIL}&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["content"], "Post 2");

    let (status, body) = app.get("/api/history").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn empty_text_is_rejected_without_side_effects() {
    let app = TestApp::new(ScriptedModel::always(r#"{"aiProbability": 50}"#)).await;

    let (status, _, body) = app
        .post_json("/api/analyze/text", json!({ "text": "   ", "userEmail": EMAIL }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "text is required");
    assert!(app.model.requests().is_empty());
    assert!(app.history(EMAIL).await.is_empty());
}

#[tokio::test]
async fn missing_user_email_is_recorded_as_anonymous() {
    let app = TestApp::new(ScriptedModel::always(r#"{"aiProbability": 50}"#)).await;

    let (status, _, _) = app
        .post_json("/api/analyze/profile", json!({ "profileUrl": "https://social.example/u/42" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    let rows = app.history("anonymous").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["type"], "profile");
}

#[tokio::test]
async fn link_and_profile_require_valid_urls() {
    let app = TestApp::new(ScriptedModel::always("{}")).await;

    let (status, _, body) = app.post_json("/api/analyze/link", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");

    let (status, _, body) = app
        .post_json("/api/analyze/profile", json!({ "profileUrl": "not a link" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert!(app.model.requests().is_empty());
}

#[tokio::test]
async fn malformed_json_uses_error_format() {
    let app = TestApp::new(ScriptedModel::always("{}")).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze/text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");
}

#[tokio::test]
async fn image_upload_is_analyzed_with_server_exif() {
    let app = TestApp::new(ScriptedModel::replying(
        r#"{"aiProbability": 20, "watermarkDetected": false, "exif": {"make": "Made up"}}"#,
    ))
    .await;

    let (status, _, body) = app
        .post_upload("/api/analyze/image", "image", "photo.png", "image/png", b"\x89PNG not really")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["humanProbability"], 80.0);
    assert_eq!(body["exif"]["present"], false);
    assert!(body["exif"].get("make").is_none());

    let requests = app.model.requests();
    let media = requests[0].media.as_ref().unwrap();
    assert_eq!(media.mime_type, "image/png");

    let rows = app.history(EMAIL).await;
    assert_eq!(rows[0]["content"], "Image: photo.png");
}

#[tokio::test]
async fn video_upload_reports_deepfake_signs() {
    let app = TestApp::new(ScriptedModel::replying(
        r#"{"aiProbability": 85, "deepfakeSigns": [{"sign": "Blink rate", "severity": "high"}]}"#,
    ))
    .await;

    let (status, _, body) = app
        .post_upload("/api/analyze/video", "video", "clip.mp4", "video/mp4", &[0u8; 64])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deepfakeSigns"][0]["severity"], "high");
    assert_eq!(app.history(EMAIL).await[0]["content"], "Video: clip.mp4");
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = TestApp::new(ScriptedModel::always("{}")).await;

    let (status, _, body) = app
        .post_upload("/api/analyze/image", "attachment", "x.png", "image/png", b"data")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "image is required");
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let mut config = AppConfig::default();
    config.server.max_upload_bytes = 1024;
    let app = TestApp::with_config(ScriptedModel::always("{}"), config).await;

    let (status, _, _) = app
        .post_upload("/api/analyze/image", "image", "big.png", "image/png", &vec![7u8; 8 * 1024])
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.model.requests().is_empty());
}

#[tokio::test]
async fn chat_replies_and_degrades() {
    let app = TestApp::new(ScriptedModel::new([
        ScriptedReply::Text("Look for inconsistent lighting.".into()),
        ScriptedReply::Error {
            status: Some(429),
            message: "RESOURCE_EXHAUSTED".into(),
        },
    ]))
    .await;

    let (status, headers, body) = app
        .post_json("/api/chat", json!({ "message": "How do I spot a fake photo?" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(MODE_HEADER).is_none());
    assert_eq!(body, json!({ "text": "Look for inconsistent lighting." }));

    let (status, headers, body) = app
        .post_json("/api/chat", json!({ "message": "And videos?" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(MODE_HEADER).unwrap(), "demo");
    assert!(body["text"].as_str().unwrap().contains("Demo Mode"));

    let (status, _, _) = app.post_json("/api/chat", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.history("anonymous").await.is_empty());
}

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new(ScriptedModel::always("{}")).await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
}
