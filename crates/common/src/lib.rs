//! VERIFY Common Library
//!
//! Shared code for the VERIFY service including:
//! - Analysis pipeline (prompts, normalization, fallback, presentation)
//! - Generative model client abstraction
//! - Database models and repository
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod analysis;
pub mod config;
pub mod db;
pub mod errors;
pub mod generative;
pub mod metrics;

// Re-export commonly used types
pub use analysis::{AnalysisService, ContentKind};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use generative::GenerativeModel;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Gemini model used for analysis and chat
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// User identifier recorded when the client supplies none
pub const ANONYMOUS_USER: &str = "anonymous";
