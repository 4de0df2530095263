//! HTTP surface for the classifier.
//!
//! Routes:
//! - `POST /api/priority` - classify a batch
//! - `GET /health` - liveness
//! - `GET /ready` - readiness, reports the configuration as it would load now

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::PriorityConfig;
use crate::normalizer::NormalizeError;
use crate::processor::PriorityProcessor;
use crate::record::Batch;

/// Where each request's configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Re-read the process environment on every request.
    Environment,
    /// Use a fixed configuration.
    Fixed(PriorityConfig),
}

impl ConfigSource {
    pub fn load(&self) -> PriorityConfig {
        match self {
            ConfigSource::Environment => PriorityConfig::from_env(),
            ConfigSource::Fixed(config) => config.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ConfigSource,
}

impl AppState {
    pub fn new(config: ConfigSource) -> Self {
        Self { config }
    }
}

/// Build the router with permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/priority", post(classify_batch))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Classify a batch; configuration is loaded fresh for each request.
async fn classify_batch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Batch>, AppError> {
    let config = state.config.load();
    let processor = PriorityProcessor::from_config(&config);

    let batch = processor.process_body(&body)?;

    Ok(Json(batch))
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "priority-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint - reports the effective configuration
async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = state.config.load();
    let rules = config.rule_set();

    Json(serde_json::json!({
        "status": "ready",
        "service": "priority-api",
        "strategy": config.strategy.as_str(),
        "output": config.output.as_str(),
        "rules": rules.len(),
        "default_priority": rules.default_priority(),
    }))
}

// Error handling

#[derive(Debug)]
pub enum AppError {
    BodyUnparseable(String),
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::BodyUnparseable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BodyUnparseable(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Could not read request body as a record batch: {}", msg),
            ),
        };

        (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], message).into_response()
    }
}
