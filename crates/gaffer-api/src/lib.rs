//! Axum HTTP API server for the Gaffer agent.
//!
//! This crate provides:
//! - The analysis pipeline orchestrator with its fallback chain
//! - The `/api/analyze`, `/health`, and `/` endpoints
//! - CORS, request id, and request logging middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::AgentConfig;
pub use error::{ApiError, ApiResult};
pub use pipeline::{AnalysisPipeline, StageBudgets, ANALYSIS_TTL, STUB_COMMENTARY};
pub use routes::create_router;
pub use state::AppState;
