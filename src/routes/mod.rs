//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - Burn flow + questionnaire API under `/api/v1/...`
/// - `/burn-on-completion` kept as a top-level alias (the path the platform's
///   existing serverless clients call)
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Burn flow
        .route("/burn-on-completion", post(http::http_post_burn))
        .route("/api/v1/burn-on-completion", post(http::http_post_burn))
        .route("/api/v1/burn-status/:address", get(http::http_get_burn_status))
        .route("/api/v1/treasury", get(http::http_get_treasury))
        // Binno questionnaire
        .route("/api/v1/questionnaire/start", post(http::http_post_questionnaire_start))
        .route("/api/v1/questionnaire/answer", post(http::http_post_questionnaire_answer))
        .route("/api/v1/questionnaire/analysis", post(http::http_post_questionnaire_analysis))
        // Ops
        .route("/api/v1/health", get(http::http_health))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
