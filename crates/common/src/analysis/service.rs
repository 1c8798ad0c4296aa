//! Analysis request pipeline
//!
//! build prompt -> call model -> repair -> backfill -> validate -> attach EXIF
//! -> persist -> respond. Quota errors swap the model output for a demo report,
//! which is persisted like any other result.

use crate::analysis::presentation::AnalysisResponse;
use crate::analysis::{exif, fallback, normalizer, prompt};
use crate::analysis::{AnalysisReport, Content, ContentKind};
use crate::config::ModelConfig;
use crate::db::{AnalysisRecord, Repository};
use crate::errors::{AppError, Result};
use crate::generative::GenerativeModel;
use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Result of one analysis request
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub response: AnalysisResponse,
    pub record: AnalysisRecord,
    /// The model was out of quota and a demo report was returned
    pub degraded: bool,
}

/// Result of one assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub text: String,
    pub degraded: bool,
}

/// Shared pipeline behind every analysis endpoint
#[derive(Clone)]
pub struct AnalysisService {
    repo: Repository,
    model: Arc<dyn GenerativeModel>,
    config: ModelConfig,
}

impl AnalysisService {
    pub fn new(repo: Repository, model: Arc<dyn GenerativeModel>, config: ModelConfig) -> Self {
        Self {
            repo,
            model,
            config,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Analyze one submission and persist the result
    #[instrument(skip(self, content), fields(content_type = %content.kind()))]
    pub async fn analyze(&self, user: &str, content: Content) -> Result<AnalysisOutcome> {
        let kind = content.kind();
        self.run_analysis(user, content).await.inspect_err(|e| {
            metrics::record_analysis_failure(kind.as_str(), e.code().as_str());
        })
    }

    async fn run_analysis(&self, user: &str, content: Content) -> Result<AnalysisOutcome> {
        let kind = content.kind();
        let start = Instant::now();

        let (mut report, degraded) = match self.model.generate(prompt::build_prompt(&content)).await {
            Ok(raw) => (Self::validate(kind, &raw)?, false),
            Err(e) if fallback::is_rate_limited(&e) => {
                if !self.config.demo_fallback {
                    return Err(AppError::RateLimited {
                        message: e.to_string(),
                    });
                }
                warn!(error = %e, "Model quota exhausted, returning demo result");
                (fallback::demo_report(kind), true)
            }
            Err(e) => return Err(e),
        };

        if let Content::Image(media) = &content {
            report.attach_exif(exif::extract(&media.data));
        }

        let record = self
            .repo
            .record(user, kind, content.summary(), report.to_payload()?)
            .await?;

        metrics::record_analysis(kind.as_str(), degraded);
        info!(
            record_id = record.id,
            degraded,
            ai_probability = ?report.ai_probability(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        let source_text = match &content {
            Content::Text { text, .. } => Some(text.as_str()),
            _ => None,
        };

        Ok(AnalysisOutcome {
            response: AnalysisResponse::new(report, source_text),
            record,
            degraded,
        })
    }

    /// Raw model text to a typed report
    fn validate(kind: ContentKind, raw: &str) -> Result<AnalysisReport> {
        let mut map = normalizer::normalize(raw);
        if kind == ContentKind::Image {
            // Metadata comes from the upload itself, never from the model.
            map.remove("exif");
        }
        AnalysisReport::from_value(kind, map)
    }

    /// Answer a free-form assistant message; nothing is persisted
    #[instrument(skip(self, message))]
    pub async fn chat(&self, message: Option<String>) -> Result<ChatOutcome> {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AppError::missing("message"))?;

        let request = prompt::build_chat_prompt(&message).with_model(self.config.chat_model.clone());
        match self.model.generate(request).await {
            Ok(text) => Ok(ChatOutcome {
                text,
                degraded: false,
            }),
            Err(e) if fallback::is_rate_limited(&e) && self.config.demo_fallback => {
                warn!(error = %e, "Model quota exhausted, returning demo chat reply");
                Ok(ChatOutcome {
                    text: fallback::demo_chat_reply(),
                    degraded: true,
                })
            }
            Err(e) if fallback::is_rate_limited(&e) => Err(AppError::RateLimited {
                message: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Most recent analyses for a user, newest first
    pub async fn history(&self, user: &str, limit: u64) -> Result<Vec<AnalysisRecord>> {
        let rows = self.repo.recent(user, limit).await?;
        metrics::record_history_read(rows.len());
        Ok(rows)
    }
}
