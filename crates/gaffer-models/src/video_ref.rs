//! Video reference normalization.
//!
//! Requests identify videos either by a fully-qualified locator (any site
//! yt-dlp understands) or by a bare YouTube video id from older frontends.
//! Collaborators always work with the normalized locator; the cache keys
//! use the raw reference as the client sent it.

use thiserror::Error;
use url::Url;

/// Errors from parsing a video reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoRefError {
    #[error("Video reference cannot be empty")]
    Empty,

    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),
}

/// A validated video reference.
///
/// Keeps both the raw client-supplied string (the cache key component) and
/// the normalized locator handed to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    raw: String,
    url: String,
}

impl VideoRef {
    /// Parse a raw reference into a normalized locator.
    ///
    /// Full `http(s)` URLs are validated and used as-is. Anything else is
    /// treated as a legacy YouTube video id.
    pub fn parse(raw: &str) -> Result<Self, VideoRefError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VideoRefError::Empty);
        }

        let url = if raw.starts_with("http://") || raw.starts_with("https://") {
            Url::parse(raw)
                .map_err(|e| VideoRefError::InvalidUrl(e.to_string()))?
                .to_string()
        } else {
            format!("https://www.youtube.com/watch?v={}", raw)
        };

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The reference exactly as the client sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized locator for collaborators.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for VideoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_passes_through() {
        let v = VideoRef::parse("https://vimeo.com/12345").unwrap();
        assert_eq!(v.raw(), "https://vimeo.com/12345");
        assert_eq!(v.url(), "https://vimeo.com/12345");
    }

    #[test]
    fn test_legacy_id_becomes_watch_url() {
        let v = VideoRef::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(v.raw(), "dQw4w9WgXcQ");
        assert_eq!(v.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(VideoRef::parse(""), Err(VideoRefError::Empty));
        assert_eq!(VideoRef::parse("   "), Err(VideoRefError::Empty));
    }

    #[test]
    fn test_malformed_url_rejected() {
        assert!(matches!(
            VideoRef::parse("https://"),
            Err(VideoRefError::InvalidUrl(_))
        ));
    }
}
