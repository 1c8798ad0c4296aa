//! Typed analysis reports
//!
//! The normalized model object is validated against the schema for its
//! content type. Field names are camelCase on the wire; fields the schema does
//! not know are kept in `extra` and passed through unchanged.

use crate::analysis::exif::ExifSummary;
use crate::analysis::ContentKind;
use crate::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields every report may carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlagiarismSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plagiarism {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub sources: Vec<PlagiarismSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    #[serde(default)]
    pub human_traits: Vec<String>,
    #[serde(default)]
    pub ai_traits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousSection {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextReport {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plagiarism: Option<Plagiarism>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credibility: Option<Credibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    #[serde(default)]
    pub suspicious_sections: Vec<SuspiciousSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManipulatedRegion {
    pub area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    #[serde(default)]
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_detected: Option<bool>,
    #[serde(default)]
    pub manipulated_regions: Vec<ManipulatedRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_search: Option<ReverseSearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepfakeSign {
    pub sign: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoReport {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub deepfake_signs: Vec<DeepfakeSign>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fake: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(rename = "isAIInfluencer", default, skip_serializing_if = "Option::is_none")]
    pub is_ai_influencer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_probability: Option<f64>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized result, tagged by content type
///
/// Serialized untagged: the wire shape is the flat report object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Text(TextReport),
    Image(ImageReport),
    Video(VideoReport),
    Link(LinkReport),
    Profile(ProfileReport),
}

fn decode<T: DeserializeOwned>(kind: ContentKind, map: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(map)).map_err(|e| AppError::InvalidModelOutput {
        content_type: kind.to_string(),
        message: e.to_string(),
    })
}

fn check_score(name: &str, value: Option<f64>) -> std::result::Result<(), String> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => {
            Err(format!("{} must be between 0 and 100, got {}", name, v))
        }
        _ => Ok(()),
    }
}

impl AnalysisReport {
    /// Validate a normalized object against the schema for `kind`
    pub fn from_value(kind: ContentKind, map: Map<String, Value>) -> Result<Self> {
        let report = match kind {
            ContentKind::Text => AnalysisReport::Text(decode(kind, map)?),
            ContentKind::Image => AnalysisReport::Image(decode(kind, map)?),
            ContentKind::Video => AnalysisReport::Video(decode(kind, map)?),
            ContentKind::Link => AnalysisReport::Link(decode(kind, map)?),
            ContentKind::Profile => AnalysisReport::Profile(decode(kind, map)?),
        };

        report
            .check_ranges()
            .map_err(|message| AppError::InvalidModelOutput {
                content_type: kind.to_string(),
                message,
            })?;

        Ok(report)
    }

    fn check_ranges(&self) -> std::result::Result<(), String> {
        let common = self.common();
        check_score("aiProbability", common.ai_probability)?;
        check_score("humanProbability", common.human_probability)?;
        check_score("confidence", common.confidence)?;

        match self {
            AnalysisReport::Text(r) => {
                check_score("plagiarism.score", r.plagiarism.as_ref().and_then(|p| p.score))?;
                check_score("credibility.score", r.credibility.as_ref().and_then(|c| c.score))?;
            }
            AnalysisReport::Link(r) => check_score("sourceRating", r.source_rating)?,
            AnalysisReport::Profile(r) => check_score("botProbability", r.bot_probability)?,
            AnalysisReport::Image(_) | AnalysisReport::Video(_) => {}
        }
        Ok(())
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            AnalysisReport::Text(_) => ContentKind::Text,
            AnalysisReport::Image(_) => ContentKind::Image,
            AnalysisReport::Video(_) => ContentKind::Video,
            AnalysisReport::Link(_) => ContentKind::Link,
            AnalysisReport::Profile(_) => ContentKind::Profile,
        }
    }

    pub fn common(&self) -> &CommonFields {
        match self {
            AnalysisReport::Text(r) => &r.common,
            AnalysisReport::Image(r) => &r.common,
            AnalysisReport::Video(r) => &r.common,
            AnalysisReport::Link(r) => &r.common,
            AnalysisReport::Profile(r) => &r.common,
        }
    }

    pub fn ai_probability(&self) -> Option<f64> {
        self.common().ai_probability
    }

    pub fn explanation(&self) -> Option<&str> {
        self.common().explanation.as_deref()
    }

    /// Attach server-side image metadata; no-op for other kinds
    pub fn attach_exif(&mut self, exif: ExifSummary) {
        if let AnalysisReport::Image(report) = self {
            report.exif = Some(exif);
        }
    }

    /// Serialized form stored in the analyses table
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_report_keeps_unknown_fields() {
        let report = AnalysisReport::from_value(
            ContentKind::Text,
            map(json!({
                "aiProbability": 81,
                "humanProbability": 19,
                "suspiciousSections": [{ "text": "delve into", "reason": "stock phrase" }],
                "readability": "high"
            })),
        )
        .unwrap();

        let AnalysisReport::Text(text) = &report else { panic!("expected text report") };
        assert_eq!(text.suspicious_sections[0].text, "delve into");
        assert_eq!(text.extra["readability"], "high");

        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["aiProbability"], 81.0);
        assert_eq!(wire["readability"], "high");
        assert!(wire.get("Text").is_none());
    }

    #[test]
    fn test_empty_object_is_valid() {
        for kind in ContentKind::ALL {
            let report = AnalysisReport::from_value(kind, Map::new()).unwrap();
            assert_eq!(report.kind(), kind);
            assert_eq!(report.ai_probability(), None);
        }
    }

    #[test]
    fn test_out_of_range_probability_is_rejected() {
        let err = AnalysisReport::from_value(
            ContentKind::Link,
            map(json!({ "aiProbability": 140, "isFake": true })),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidModelOutput { .. }));
        assert!(err.to_string().contains("aiProbability"));
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let err = AnalysisReport::from_value(
            ContentKind::Profile,
            map(json!({ "redFlags": "too many followers" })),
        )
        .unwrap_err();
        assert!(err.to_string().contains("profile"));
    }

    #[test]
    fn test_profile_influencer_field_name() {
        let report = AnalysisReport::from_value(
            ContentKind::Profile,
            map(json!({ "isAIInfluencer": true, "botProbability": 88, "redFlags": ["stock photos"] })),
        )
        .unwrap();
        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["isAIInfluencer"], true);
        assert_eq!(wire["redFlags"][0], "stock photos");
    }

    #[test]
    fn test_attach_exif_only_on_images() {
        let mut image = AnalysisReport::from_value(ContentKind::Image, Map::new()).unwrap();
        image.attach_exif(ExifSummary::absent());
        let wire = serde_json::to_value(&image).unwrap();
        assert_eq!(wire["exif"]["present"], false);

        let mut video = AnalysisReport::from_value(ContentKind::Video, Map::new()).unwrap();
        video.attach_exif(ExifSummary::absent());
        assert!(serde_json::to_value(&video).unwrap().get("exif").is_none());
    }
}
