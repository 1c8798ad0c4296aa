//! Content analysis pipeline
//!
//! - `content`: what a user submitted
//! - `prompt`: instruction text sent to the model
//! - `normalizer`: JSON repair and probability backfill for raw model output
//! - `report`: typed reports, one schema per content type
//! - `fallback`: canned demo results when the model is out of quota
//! - `exif`: image metadata attached to image reports
//! - `presentation`: verdict banner and text highlights
//! - `service`: the request pipeline tying the above to storage

pub mod content;
pub mod exif;
pub mod fallback;
pub mod normalizer;
pub mod presentation;
pub mod prompt;
pub mod report;
pub mod service;

pub use content::{Content, ContentKind, MediaUpload};
pub use report::AnalysisReport;
pub use service::{AnalysisOutcome, AnalysisService, ChatOutcome};
