//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during frame capture or caption extraction.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("{tool} failed: {message}")]
    CommandFailed {
        tool: &'static str,
        message: String,
        stderr: Option<String>,
    },

    #[error("No caption track available")]
    NoCaptionTrack,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn command_failed(
        tool: &'static str,
        message: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::CommandFailed {
            tool,
            message: message.into(),
            stderr,
        }
    }
}
