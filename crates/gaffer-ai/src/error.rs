//! Error types for AI operations.

use thiserror::Error;

/// Result type for AI operations.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from the Anthropic API clients.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No text content in API response")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
