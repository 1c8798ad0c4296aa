//! Content analysis handlers
//!
//! Text, link and profile submissions arrive as JSON; images and videos as
//! multipart uploads. Every handler resolves the submitter, builds a
//! [`Content`] and hands it to the shared analysis pipeline.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{validation_error, with_mode, ApiJson};
use crate::AppState;
use verify_common::{
    analysis::{AnalysisOutcome, Content, MediaUpload},
    errors::Result,
    ANONYMOUS_USER,
};

/// Request to analyze a piece of text
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub text: Option<String>,

    /// Language for the explanation
    #[validate(length(max = 64))]
    pub language: Option<String>,

    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    #[validate(url)]
    pub url: Option<String>,

    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[validate(url)]
    pub profile_url: Option<String>,

    pub user_email: Option<String>,
}

/// Submitter recorded with the analysis; blank or missing becomes anonymous
fn user_identifier(email: Option<String>) -> String {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string())
}

fn respond(outcome: AnalysisOutcome) -> Response {
    with_mode(Json(outcome.response).into_response(), outcome.degraded)
}

/// Analyze text for AI authorship, plagiarism and credibility
pub async fn analyze_text(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TextRequest>,
) -> Result<Response> {
    request.validate().map_err(validation_error)?;

    let content = Content::text(request.text, request.language)?;
    let user = user_identifier(request.user_email);

    let outcome = state.service.analyze(&user, content).await?;
    Ok(respond(outcome))
}

/// Analyze a web page for fake news and source reliability
pub async fn analyze_link(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LinkRequest>,
) -> Result<Response> {
    let content = Content::link(request.url.clone())?;
    request.validate().map_err(validation_error)?;
    let user = user_identifier(request.user_email);

    let outcome = state.service.analyze(&user, content).await?;
    Ok(respond(outcome))
}

/// Analyze a social-media profile for AI influencers and bots
pub async fn analyze_profile(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<Response> {
    let content = Content::profile(request.profile_url.clone())?;
    request.validate().map_err(validation_error)?;
    let user = user_identifier(request.user_email);

    let outcome = state.service.analyze(&user, content).await?;
    Ok(respond(outcome))
}

/// Analyze an uploaded image; EXIF is read from the file itself
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let form = UploadForm::read(multipart?, "image").await?;
    let content = Content::image(form.file)?;
    let user = user_identifier(form.user_email);

    let outcome = state.service.analyze(&user, content).await?;
    Ok(respond(outcome))
}

/// Analyze an uploaded video for deepfake signs
pub async fn analyze_video(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let form = UploadForm::read(multipart?, "video").await?;
    let content = Content::video(form.file)?;
    let user = user_identifier(form.user_email);

    let outcome = state.service.analyze(&user, content).await?;
    Ok(respond(outcome))
}

/// Fields of a media upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<MediaUpload>,
    user_email: Option<String>,
}

impl UploadForm {
    /// Collect the named file part and `userEmail`; other parts are ignored
    async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                let filename = field.file_name().map(str::to_string);
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;

                tracing::debug!(
                    field = %name,
                    mime_type = %mime_type,
                    bytes = data.len(),
                    "Received upload"
                );

                form.file = Some(MediaUpload {
                    filename,
                    mime_type,
                    data: data.to_vec(),
                });
            } else if name == "userEmail" {
                form.user_email = Some(field.text().await?);
            }
        }

        Ok(form)
    }
}
