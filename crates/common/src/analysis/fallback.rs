//! Demo-mode fallback
//!
//! When the external model reports quota exhaustion the request degrades to a
//! canned, content-type-specific result instead of failing. The state is
//! per request and never persisted.

use crate::analysis::report::*;
use crate::analysis::ContentKind;
use crate::errors::AppError;
use serde_json::Map;

/// Marker present in every canned explanation
pub const DEMO_MODE_NOTICE: &str = "Demo Mode";

const DEMO_CONFIDENCE: f64 = 75.0;

/// Does this error carry a rate-limit / quota signature?
pub fn is_rate_limited(err: &AppError) -> bool {
    match err {
        AppError::RateLimited { .. } => true,
        AppError::Upstream { status, message } => {
            *status == Some(429)
                || message.contains("429")
                || message.contains("RESOURCE_EXHAUSTED")
        }
        _ => false,
    }
}

fn explanation(detail: &str) -> Option<String> {
    Some(format!(
        "{}: the analysis service is temporarily over its quota, so this is a sample result. {}",
        DEMO_MODE_NOTICE, detail
    ))
}

fn common(ai: f64, detail: &str) -> CommonFields {
    CommonFields {
        ai_probability: Some(ai),
        human_probability: Some(100.0 - ai),
        confidence: Some(DEMO_CONFIDENCE),
        explanation: explanation(detail),
    }
}

/// Canned result for a content type
pub fn demo_report(kind: ContentKind) -> AnalysisReport {
    match kind {
        ContentKind::Text => AnalysisReport::Text(TextReport {
            common: common(65.0, "The text shows uniform sentence structure typical of generated prose."),
            plagiarism: Some(Plagiarism {
                score: Some(12.0),
                sources: Vec::new(),
            }),
            credibility: Some(Credibility {
                score: Some(70.0),
                notes: Some("No verifiable citations were found.".to_string()),
            }),
            comparison: Some(Comparison {
                human_traits: vec!["Occasional informal phrasing".to_string()],
                ai_traits: vec![
                    "Consistent paragraph length".to_string(),
                    "Generic transitions".to_string(),
                ],
            }),
            suspicious_sections: Vec::new(),
            extra: Map::new(),
        }),
        ContentKind::Image => AnalysisReport::Image(ImageReport {
            common: common(55.0, "Lighting and texture are mostly consistent."),
            watermark_detected: Some(false),
            manipulated_regions: Vec::new(),
            reverse_search: Some(ReverseSearch {
                found: Some(false),
                matches: Vec::new(),
            }),
            exif: None,
            extra: Map::new(),
        }),
        ContentKind::Video => AnalysisReport::Video(VideoReport {
            common: common(40.0, "No strong frame-level artifacts were identified."),
            deepfake_signs: vec![DeepfakeSign {
                sign: "Slight lip-sync drift".to_string(),
                severity: Some("low".to_string()),
                timestamp: None,
            }],
            extra: Map::new(),
        }),
        ContentKind::Link => AnalysisReport::Link(LinkReport {
            common: common(30.0, "The source could not be checked live."),
            source_rating: Some(60.0),
            is_fake: Some(false),
            extra: Map::new(),
        }),
        ContentKind::Profile => AnalysisReport::Profile(ProfileReport {
            common: common(45.0, "Posting cadence looks partly automated."),
            is_ai_influencer: Some(false),
            bot_probability: Some(35.0),
            red_flags: vec!["Irregular posting schedule".to_string()],
            extra: Map::new(),
        }),
    }
}

/// Canned assistant reply
pub fn demo_chat_reply() -> String {
    format!(
        "{}: the assistant is temporarily unavailable because the model quota is exhausted. \
         Please try again in a few minutes.",
        DEMO_MODE_NOTICE
    )
}
