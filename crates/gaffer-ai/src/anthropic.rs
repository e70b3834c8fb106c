//! Anthropic Messages API plumbing shared by the vision and analogy clients.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, AiResult};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API request.
#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageSource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: &'static str,
    pub data: String,
}

impl ImageSource {
    pub fn base64_jpeg(data: impl Into<String>) -> Self {
        Self {
            kind: "base64",
            media_type: "image/jpeg",
            data: data.into(),
        }
    }
}

/// Messages API response, reduced to what we consume.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

/// POST a Messages request and extract the first text block.
pub(crate) async fn send_messages(
    http: &Client,
    base_url: &str,
    api_key: &str,
    request: &MessagesRequest,
) -> AiResult<String> {
    let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));

    let response = http
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AiError::Api { status, body });
    }

    let parsed: MessagesResponse = response.json().await?;
    let text = parsed
        .content
        .iter()
        .find_map(|block| block.text.as_deref())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AiError::EmptyResponse)?;

    Ok(text)
}
