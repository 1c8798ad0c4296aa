//! Submitted content and its storage summary

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters of submitted text kept in the stored summary
pub const SUMMARY_CHARS: usize = 500;

/// Closed set of content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
    Video,
    Link,
    Profile,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Text,
        ContentKind::Image,
        ContentKind::Video,
        ContentKind::Link,
        ContentKind::Profile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Link => "link",
            ContentKind::Profile => "profile",
        }
    }

    /// Capitalized name used in media summaries
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Text => "Text",
            ContentKind::Image => "Image",
            ContentKind::Video => "Video",
            ContentKind::Link => "Link",
            ContentKind::Profile => "Profile",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        ContentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!("unknown content type: {}", s),
            })
    }
}

/// An uploaded image or video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub filename: Option<String>,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// What the user asked us to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text {
        text: String,
        language: Option<String>,
    },
    Image(MediaUpload),
    Video(MediaUpload),
    Link {
        url: String,
    },
    Profile {
        profile_url: String,
    },
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::missing(field))
}

fn required_media(field: &str, media: Option<MediaUpload>) -> Result<MediaUpload> {
    media
        .filter(|m| !m.data.is_empty())
        .ok_or_else(|| AppError::missing(field))
}

impl Content {
    /// Text submission; blank text is rejected
    pub fn text(text: Option<String>, language: Option<String>) -> Result<Self> {
        Ok(Content::Text {
            text: required("text", text)?,
            language: language.filter(|l| !l.trim().is_empty()),
        })
    }

    pub fn image(upload: Option<MediaUpload>) -> Result<Self> {
        required_media("image", upload).map(Content::Image)
    }

    pub fn video(upload: Option<MediaUpload>) -> Result<Self> {
        required_media("video", upload).map(Content::Video)
    }

    pub fn link(url: Option<String>) -> Result<Self> {
        Ok(Content::Link {
            url: required("url", url)?.trim().to_string(),
        })
    }

    pub fn profile(profile_url: Option<String>) -> Result<Self> {
        Ok(Content::Profile {
            profile_url: required("profileUrl", profile_url)?.trim().to_string(),
        })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text { .. } => ContentKind::Text,
            Content::Image(_) => ContentKind::Image,
            Content::Video(_) => ContentKind::Video,
            Content::Link { .. } => ContentKind::Link,
            Content::Profile { .. } => ContentKind::Profile,
        }
    }

    /// Representation kept in the analyses table
    pub fn summary(&self) -> String {
        match self {
            Content::Text { text, .. } => text.chars().take(SUMMARY_CHARS).collect(),
            Content::Image(media) | Content::Video(media) => format!(
                "{}: {}",
                self.kind().label(),
                media.filename.as_deref().unwrap_or("upload")
            ),
            Content::Link { url } => url.clone(),
            Content::Profile { profile_url } => profile_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("audio".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_blank_text_is_missing() {
        let err = Content::text(Some("   ".into()), None).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "text"));
        assert!(Content::text(None, None).is_err());
    }

    #[test]
    fn test_text_summary_truncates_on_char_boundary() {
        let text = "é".repeat(600);
        let content = Content::text(Some(text), None).unwrap();
        let summary = content.summary();
        assert_eq!(summary.chars().count(), SUMMARY_CHARS);
    }

    #[test]
    fn test_media_summary_uses_filename() {
        let upload = MediaUpload {
            filename: Some("cat.jpg".into()),
            mime_type: "image/jpeg".into(),
            data: vec![0xff, 0xd8],
        };
        assert_eq!(Content::image(Some(upload.clone())).unwrap().summary(), "Image: cat.jpg");

        let unnamed = MediaUpload { filename: None, ..upload };
        assert_eq!(Content::video(Some(unnamed)).unwrap().summary(), "Video: upload");
    }

    #[test]
    fn test_empty_upload_is_missing() {
        let upload = MediaUpload {
            filename: Some("empty.mp4".into()),
            mime_type: "video/mp4".into(),
            data: vec![],
        };
        let err = Content::video(Some(upload)).unwrap_err();
        assert!(matches!(err, AppError::MissingField { ref field } if field == "video"));
    }

    #[test]
    fn test_profile_field_name() {
        let err = Content::profile(None).unwrap_err();
        assert_eq!(err.to_string(), "profileUrl is required");
    }
}
