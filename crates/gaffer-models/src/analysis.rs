//! Analyze request/response wire types.
//!
//! Field names match the frontend contract, which uses camelCase
//! (`videoId`, `originalCommentary`, `nflAnalogy`).

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/analyze`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    /// Video URL (any yt-dlp supported site) or a bare YouTube video id
    /// kept for backward compatibility with older frontends.
    #[serde(rename = "videoId")]
    pub video_id: String,
    /// Playback position in seconds.
    pub timestamp: f64,
}

/// Response body for `POST /api/analyze`.
///
/// Both text fields are always populated: internal stage failures degrade
/// to fallbacks before this type is built, never into a partial response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AnalyzeResponse {
    /// Soccer commentary describing the scene.
    #[serde(rename = "originalCommentary")]
    pub original_commentary: String,
    /// The NFL analogy for that commentary.
    #[serde(rename = "nflAnalogy")]
    pub nfl_analogy: String,
    /// Echoes the requesting call's timestamp, even on a cache hit for a
    /// neighboring second.
    pub timestamp: f64,
    /// Whether the result was served from the in-memory cache.
    pub cached: bool,
}

/// Clamp a timestamp to the valid range.
///
/// Negative playback positions occasionally arrive from seeking frontends;
/// they clamp to zero rather than producing negative cache key seconds.
pub fn clamp_timestamp(timestamp: f64) -> f64 {
    if timestamp < 0.0 {
        0.0
    } else {
        timestamp
    }
}
