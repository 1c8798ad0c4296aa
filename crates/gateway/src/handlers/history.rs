//! Analysis history handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ApiQuery;
use crate::AppState;
use verify_common::{
    db::AnalysisRecord,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: Option<String>,
    pub limit: Option<u64>,
}

/// One stored analysis as the dashboard lists it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub user_email: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub content: String,
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRecord> for HistoryEntry {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            result: record.result_json(),
            id: record.id,
            user_email: record.user_identifier,
            content_type: record.content_type,
            content: record.content_summary,
            created_at: record.created_at,
        }
    }
}

/// Most recent analyses for an email, newest first
pub async fn history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>> {
    let email = query
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::missing("email"))?;
    let limit = state.config.history.clamp(query.limit);

    let rows = state.service.history(&email, limit).await?;

    tracing::debug!(rows = rows.len(), limit, "History served");

    Ok(Json(rows.into_iter().map(HistoryEntry::from).collect()))
}
