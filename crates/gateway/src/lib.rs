//! VERIFY API Gateway
//!
//! HTTP surface of the service:
//! - Content analysis endpoints (text, image, video, link, profile)
//! - Assistant chat
//! - Per-user analysis history
//! - Liveness and readiness probes

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use verify_common::{AnalysisService, AppConfig, GenerativeModel, Repository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: AnalysisService,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Repository, model: Arc<dyn GenerativeModel>) -> Self {
        let service = AnalysisService::new(repo, model, config.model.clone());
        Self {
            config: Arc::new(config),
            service,
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        // Analysis endpoints
        .route("/analyze/text", post(handlers::analyze::analyze_text))
        .route("/analyze/image", post(handlers::analyze::analyze_image))
        .route("/analyze/video", post(handlers::analyze::analyze_video))
        .route("/analyze/link", post(handlers::analyze::analyze_link))
        .route("/analyze/profile", post(handlers::analyze::analyze_profile))
        // Assistant
        .route("/chat", post(handlers::chat::chat))
        // History
        .route("/history", get(handlers::history::history));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}
