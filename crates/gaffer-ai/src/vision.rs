//! Vision analyzer: still frame in, soccer commentary out.

use reqwest::Client;
use tracing::{debug, info};

use crate::anthropic::{
    send_messages, ContentBlock, ImageSource, Message, MessagesRequest, DEFAULT_BASE_URL,
};
use crate::error::{AiError, AiResult};

const VISION_MODEL: &str = "claude-3-5-haiku-20241022";
const VISION_MAX_TOKENS: u32 = 300;

const VISION_PROMPT: &str = "You are a soccer commentator. Describe what is happening \
in this frame from a soccer match in one or two sentences of live commentary. Focus on \
player positioning, the phase of play, and the tactical situation. Respond with the \
commentary only.";

/// Generates commentary from video frames via the Anthropic vision API.
pub struct VisionAnalyzer {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl VisionAnalyzer {
    /// Create an analyzer. With no API key the analyzer reports itself
    /// disabled and refuses calls; the orchestrator checks `enabled()`
    /// before invoking it.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client at a different API endpoint (tests).
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Whether the vision path is configured.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Describe a base64-encoded JPEG frame.
    pub async fn describe_frame(&self, frame_base64: &str) -> AiResult<String> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

        debug!(frame_chars = frame_base64.len(), "Sending frame for vision analysis");

        let request = MessagesRequest {
            model: VISION_MODEL.to_string(),
            max_tokens: VISION_MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource::base64_jpeg(frame_base64),
                    },
                    ContentBlock::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                ],
            }],
        };

        let commentary = send_messages(&self.http, &self.base_url, api_key, &request).await?;
        info!(chars = commentary.len(), "Vision commentary generated");
        Ok(commentary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_enabled_tracks_api_key() {
        assert!(!VisionAnalyzer::new(None).enabled());
        assert!(VisionAnalyzer::new(Some("sk-test".to_string())).enabled());
    }

    #[tokio::test]
    async fn test_describe_frame_without_key_is_refused() {
        let analyzer = VisionAnalyzer::new(None);
        assert!(matches!(
            analyzer.describe_frame("Zm9v").await,
            Err(AiError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_describe_frame_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "  The back line steps up.  "}]
            })))
            .mount(&server)
            .await;

        let analyzer = VisionAnalyzer::with_base_url(Some("sk-test".to_string()), server.uri());
        let commentary = analyzer.describe_frame("Zm9v").await.unwrap();
        assert_eq!(commentary, "The back line steps up.");
    }

    #[tokio::test]
    async fn test_describe_frame_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let analyzer = VisionAnalyzer::with_base_url(Some("sk-test".to_string()), server.uri());
        assert!(matches!(
            analyzer.describe_frame("Zm9v").await,
            Err(AiError::Api { status: 529, .. })
        ));
    }
}
