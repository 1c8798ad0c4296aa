//! Data the dashboard renders alongside a report
//!
//! The verdict banner thresholds on `aiProbability`; text highlights map the
//! model's suspicious fragments back onto the submitted text.

use crate::analysis::report::{AnalysisReport, SuspiciousSection};
use serde::Serialize;

/// `aiProbability` at or above which content is called likely AI / fake
pub const LIKELY_AI_THRESHOLD: f64 = 70.0;

/// `aiProbability` at or above which content is called suspicious
pub const SUSPICIOUS_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLevel {
    LikelyAi,
    Suspicious,
    LikelyAuthentic,
    Inconclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub level: VerdictLevel,
    pub label: &'static str,
}

impl Verdict {
    pub fn from_ai_probability(ai_probability: Option<f64>) -> Self {
        let level = match ai_probability {
            None => VerdictLevel::Inconclusive,
            Some(p) if p >= LIKELY_AI_THRESHOLD => VerdictLevel::LikelyAi,
            Some(p) if p >= SUSPICIOUS_THRESHOLD => VerdictLevel::Suspicious,
            Some(_) => VerdictLevel::LikelyAuthentic,
        };

        let label = match level {
            VerdictLevel::LikelyAi => "Likely AI-generated or fake",
            VerdictLevel::Suspicious => "Suspicious",
            VerdictLevel::LikelyAuthentic => "Likely authentic",
            VerdictLevel::Inconclusive => "Inconclusive",
        };

        Self { level, label }
    }
}

/// A span of the submitted text flagged by the model (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Earliest start of `fragment` that overlaps no claimed span; every start
/// position is tried, including ones inside a rejected occurrence
fn first_free_occurrence(input: &str, fragment: &str, claimed: &[Highlight]) -> Option<usize> {
    let mut pos = 0;
    while let Some(offset) = input[pos..].find(fragment) {
        let start = pos + offset;
        let end = start + fragment.len();
        if claimed.iter().all(|h| end <= h.start || start >= h.end) {
            return Some(start);
        }
        let step = input[start..].chars().next().map_or(1, char::len_utf8);
        pos = start + step;
    }
    None
}

/// Locate suspicious fragments in `input`, longest first
///
/// Each fragment claims its first occurrence that does not overlap a span
/// already claimed by a longer fragment. Fragments that never match are
/// dropped. The result is ordered by position.
pub fn highlight_spans(input: &str, sections: &[SuspiciousSection]) -> Vec<Highlight> {
    let mut ordered: Vec<&SuspiciousSection> = sections
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();
    ordered.sort_by(|a, b| b.text.trim().len().cmp(&a.text.trim().len()));

    let mut claimed: Vec<Highlight> = Vec::new();
    for section in ordered {
        let fragment = section.text.trim();
        if let Some(start) = first_free_occurrence(input, fragment, &claimed) {
            claimed.push(Highlight {
                start,
                end: start + fragment.len(),
                text: fragment.to_string(),
                reason: section.reason.clone(),
            });
        }
    }

    claimed.sort_by_key(|h| h.start);
    claimed
}

/// Report plus its rendering hints, as returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

impl AnalysisResponse {
    /// `source_text` is the submitted text, for text analyses
    pub fn new(report: AnalysisReport, source_text: Option<&str>) -> Self {
        let highlights = match (&report, source_text) {
            (AnalysisReport::Text(text), Some(input)) => {
                highlight_spans(input, &text.suspicious_sections)
            }
            _ => Vec::new(),
        };

        Self {
            verdict: Verdict::from_ai_probability(report.ai_probability()),
            report,
            highlights,
        }
    }
}
