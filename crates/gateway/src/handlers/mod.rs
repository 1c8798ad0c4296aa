//! API handlers module

pub mod analyze;
pub mod chat;
pub mod health;
pub mod history;

use axum::{
    extract::{FromRequest, FromRequestParts, Query},
    http::HeaderValue,
    response::Response,
    Json,
};
use validator::ValidationErrors;
use verify_common::errors::AppError;

/// Response header marking a canned demo result
pub const MODE_HEADER: &str = "x-verify-mode";

/// JSON body extractor whose rejections use the service error format
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the service error format
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Tag degraded responses so clients can tell demo output apart
pub(crate) fn with_mode(mut response: Response, degraded: bool) -> Response {
    if degraded {
        response
            .headers_mut()
            .insert(MODE_HEADER, HeaderValue::from_static("demo"));
    }
    response
}

pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    AppError::Validation {
        field: errors.field_errors().keys().next().map(|f| f.to_string()),
        message: errors.to_string(),
    }
}
