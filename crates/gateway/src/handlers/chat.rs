//! Assistant chat handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{with_mode, ApiJson};
use crate::AppState;
use verify_common::errors::Result;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
}

/// Free-form question about AI content; replies are not stored
pub async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Response> {
    let outcome = state.service.chat(request.message).await?;

    Ok(with_mode(
        Json(ChatResponse { text: outcome.text }).into_response(),
        outcome.degraded,
    ))
}
