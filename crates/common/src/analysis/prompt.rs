//! Instruction text sent to the external model
//!
//! Each content type has a fixed instruction and a description of the JSON
//! object the model must return. The same content always yields the same
//! request.

use crate::analysis::{Content, MediaUpload};
use crate::generative::GenerateRequest;

const ANALYST_ROLE: &str = "You are VERIFY, a forensic analyst that assesses whether content \
was produced or manipulated by generative AI. Be specific, cite observable evidence, and \
never invent facts you cannot see.";

const CHAT_INSTRUCTION: &str = "You are the VERIFY assistant. Help users understand AI-generated \
content, deepfakes, misinformation, and how to read VERIFY analysis results. Keep answers short \
and practical.";

const SCORE_RULES: &str = "All probabilities and scores are numbers from 0 to 100. \
aiProbability + humanProbability must equal 100. Respond with the JSON object only.";

const TEXT_SHAPE: &str = r#"{
  "aiProbability": number,
  "humanProbability": number,
  "confidence": number,
  "explanation": string,
  "plagiarism": { "score": number, "sources": [{ "title": string, "url": string, "similarity": number }] },
  "credibility": { "score": number, "notes": string },
  "comparison": { "humanTraits": [string], "aiTraits": [string] },
  "suspiciousSections": [{ "text": string (exact quote from the input), "reason": string }]
}"#;

const IMAGE_SHAPE: &str = r#"{
  "aiProbability": number,
  "humanProbability": number,
  "confidence": number,
  "explanation": string,
  "watermarkDetected": boolean,
  "manipulatedRegions": [{ "area": string, "description": string }],
  "reverseSearch": { "found": boolean, "matches": [string] }
}"#;

const VIDEO_SHAPE: &str = r#"{
  "aiProbability": number,
  "humanProbability": number,
  "confidence": number,
  "explanation": string,
  "deepfakeSigns": [{ "sign": string, "severity": "low" | "medium" | "high", "timestamp": string }]
}"#;

const LINK_SHAPE: &str = r#"{
  "aiProbability": number,
  "humanProbability": number,
  "confidence": number,
  "explanation": string,
  "sourceRating": number,
  "isFake": boolean
}"#;

const PROFILE_SHAPE: &str = r#"{
  "aiProbability": number,
  "humanProbability": number,
  "confidence": number,
  "explanation": string,
  "isAIInfluencer": boolean,
  "botProbability": number,
  "redFlags": [string]
}"#;

fn instruction(task: &str, shape: &str, subject: &str) -> String {
    format!(
        "{task}\n\nReturn a JSON object with exactly this shape:\n{shape}\n\n{SCORE_RULES}\n\n{subject}"
    )
}

fn media_request(task: &str, shape: &str, media: &MediaUpload) -> GenerateRequest {
    let subject = match &media.filename {
        Some(name) => format!("The file \"{}\" ({}) is attached.", name, media.mime_type),
        None => format!("The file ({}) is attached.", media.mime_type),
    };

    GenerateRequest::json(instruction(task, shape, &subject))
        .with_system_instruction(ANALYST_ROLE)
        .with_media(media.mime_type.clone(), media.data.clone())
}

/// Build the analysis request for submitted content
pub fn build_prompt(content: &Content) -> GenerateRequest {
    match content {
        Content::Text { text, language } => {
            let language = language.as_deref().unwrap_or("English");
            let task = format!(
                "Analyze the following text. Estimate how likely it is to be AI-generated, \
                 check it for plagiarism and factual credibility, compare its human and AI \
                 traits, and quote the exact passages that look machine-written. \
                 Write the explanation in {}.",
                language
            );
            let subject = format!("Text to analyze:\n\"\"\"\n{}\n\"\"\"", text);
            GenerateRequest::json(instruction(&task, TEXT_SHAPE, &subject))
                .with_system_instruction(ANALYST_ROLE)
        }
        Content::Image(media) => media_request(
            "Analyze the attached image. Estimate how likely it is to be AI-generated or \
             edited, look for visible or invisible watermarks, describe any manipulated \
             regions, and say whether it resembles widely circulated images.",
            IMAGE_SHAPE,
            media,
        ),
        Content::Video(media) => media_request(
            "Analyze the attached video for deepfake signs: facial warping, lip-sync drift, \
             unnatural blinking, lighting inconsistencies, and audio artifacts.",
            VIDEO_SHAPE,
            media,
        ),
        Content::Link { url } => {
            let task = "Assess the web page at the URL below. Judge whether it spreads fake \
                        news or AI-generated content, and rate the reliability of the source.";
            GenerateRequest::json(instruction(task, LINK_SHAPE, &format!("URL: {}", url)))
                .with_system_instruction(ANALYST_ROLE)
        }
        Content::Profile { profile_url } => {
            let task = "Assess the social-media profile below. Judge whether it is an \
                        AI-generated influencer or an automated bot account and list the red \
                        flags you notice.";
            GenerateRequest::json(instruction(
                task,
                PROFILE_SHAPE,
                &format!("Profile URL: {}", profile_url),
            ))
            .with_system_instruction(ANALYST_ROLE)
        }
    }
}

/// Build the request for a free-form assistant message
pub fn build_chat_prompt(message: &str) -> GenerateRequest {
    GenerateRequest::text(message).with_system_instruction(CHAT_INSTRUCTION)
}
