//! Generative model abstraction
//!
//! Provides a unified interface over the external model:
//! - Google Gemini (`generateContent`, inline base64 media)
//! - Scripted responses for tests and offline development
//!
//! One request is one blocking round trip: no retry, no backoff.

use crate::config::ModelConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Binary payload sent alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Expected shape of the model's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub media: Option<InlineMedia>,
    pub format: ResponseFormat,
    /// Overrides the client's default model
    pub model: Option<String>,
}

impl GenerateRequest {
    /// Text prompt expecting a JSON reply
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            prompt: prompt.into(),
            media: None,
            format: ResponseFormat::Json,
            model: None,
        }
    }

    /// Text prompt expecting free-form text
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            format: ResponseFormat::Text,
            ..Self::json(prompt)
        }
    }

    pub fn with_media(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.media = Some(InlineMedia {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Trait for text generation
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run one generation and return the raw text of the reply
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Get the default model name
    fn model_name(&self) -> &str;
}

/// Google Gemini client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AppError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| GEMINI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn request_body(request: &GenerateRequest) -> Value {
        let mut parts = vec![json!({ "text": request.prompt })];
        if let Some(media) = &request.media {
            parts.push(json!({
                "inlineData": {
                    "mimeType": media.mime_type,
                    "data": general_purpose::STANDARD.encode(&media.data),
                }
            }));
        }

        let mut body = json!({
            "contents": [{ "role": "user", "parts": parts }],
        });

        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        if request.format == ResponseFormat::Json {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        body
    }

    async fn make_request(&self, model: &str, request: &GenerateRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                status: None,
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AppError::Upstream {
            status: Some(status.as_u16()),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                message: describe_api_error(status.as_u16(), &body),
            });
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| AppError::Upstream {
            status: Some(status.as_u16()),
            message: format!("Failed to parse response: {}", e),
        })?;

        extract_candidate_text(&data)
    }
}

/// Render a Gemini error body as "<http status> <api status>: <message>"
fn describe_api_error(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let api_status = error
        .and_then(|e| e.get("status"))
        .and_then(Value::as_str);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(body);

    match api_status {
        Some(api_status) => format!("{} {}: {}", status, api_status, message),
        None => format!("{}: {}", status, message),
    }
}

/// Concatenate the text parts of the first candidate
fn extract_candidate_text(data: &Value) -> Result<String> {
    let Some(candidate) = data["candidates"].get(0) else {
        let reason = data["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates returned");
        return Err(AppError::Upstream {
            status: None,
            message: format!("Model returned no content ({})", reason),
        });
    };

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let finish = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(AppError::Upstream {
            status: None,
            message: format!("Model returned an empty reply (finish reason: {})", finish),
        });
    }

    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let start = Instant::now();

        tracing::info!(
            model = %model,
            has_media = request.media.is_some(),
            format = ?request.format,
            "Calling Gemini"
        );

        let result = self.make_request(&model, &request).await;
        metrics::record_model_call(start.elapsed().as_secs_f64(), &model, result.is_ok());

        if let Err(e) = &result {
            tracing::warn!(model = %model, error = %e, "Gemini request failed");
        }
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// One queued reply for [`ScriptedModel`]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error { status: Option<u16>, message: String },
}

/// Model that replays queued replies, for tests and the `mock` provider
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<String>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Model that answers every request with the same text
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::new([])
        }
    }

    /// Model that answers with the given text once
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new([ScriptedReply::Text(reply.into())])
    }

    /// Model that fails once with the given upstream error
    pub fn failing(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new([ScriptedReply::Error {
            status,
            message: message.into(),
        }])
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error { status, message }) => {
                Err(AppError::Upstream { status, message })
            }
            None => self.fallback.clone().ok_or_else(|| AppError::Upstream {
                status: None,
                message: "No scripted reply left".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Create a model client based on configuration
pub fn create_model(config: &ModelConfig) -> Result<Arc<dyn GenerativeModel>> {
    match config.provider.as_str() {
        "gemini" => {
            let key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
                message: format!(
                    "Gemini API key required (set model.api_key or {})",
                    crate::config::API_KEY_ENV
                ),
            })?;
            Ok(Arc::new(GeminiClient::new(
                key,
                config.model.clone(),
                config.api_base.clone(),
                config.timeout(),
            )?))
        }
        "mock" => Ok(Arc::new(ScriptedModel::always(
            r#"{"aiProbability": 50, "confidence": 50, "explanation": "Mock model reply"}"#,
        ))),
        other => Err(AppError::Configuration {
            message: format!("Unknown model provider: {}", other),
        }),
    }
}
