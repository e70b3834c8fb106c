//! Health and service descriptor handlers.
//!
//! Both are pure reflections of current configuration, never invoking the
//! pipeline.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub has_api_key: bool,
    pub has_vision: bool,
    pub port: u16,
    pub message: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let has_vision = state.pipeline.vision_enabled();

    let message = if has_vision {
        "Vision analysis enabled".to_string()
    } else {
        "Vision analysis disabled - set ANTHROPIC_API_KEY to enable".to_string()
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gaffer-agent".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        has_api_key: state.config.has_api_key(),
        has_vision,
        port: state.config.port,
        message,
    })
}

/// Root endpoint with the service descriptor.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "Gaffer Agent",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "/api/analyze",
            "health": "/health",
        },
        "vision_enabled": state.pipeline.vision_enabled(),
    }))
}
