//! Analogy generator: soccer commentary in, NFL analogy out.
//!
//! Runs in one of two global modes selected at construction: AI-backed when
//! an API key is configured, deterministic stub otherwise. The stub is also
//! the fallback when an AI call fails, applied by the caller to whatever
//! commentary was actually produced.

use reqwest::Client;
use tracing::{debug, info};

use crate::anthropic::{send_messages, ContentBlock, Message, MessagesRequest, DEFAULT_BASE_URL};
use crate::error::AiResult;

const ANALOGY_MODEL: &str = "claude-3-5-haiku-20241022";
const ANALOGY_MAX_TOKENS: u32 = 300;

/// Keyword table for the deterministic stub transform. First match wins;
/// order goes from specific phrases to generic ones.
const STUB_MAPPINGS: &[(&str, &str)] = &[
    (
        "counter-attack",
        "a quick-strike drive off a turnover, the offense racing upfield before the defense can get set",
    ),
    (
        "building up play",
        "an offense methodically working through its progressions, the quarterback scanning for the open receiver",
    ),
    (
        "defensive shape",
        "a disciplined zone defense collapsing on the middle of the field, taking away the easy throw",
    ),
    (
        "final third",
        "an offense operating in the red zone, probing for a crease in the coverage",
    ),
    (
        "creating space",
        "receivers running crossing routes to pull defenders apart and open up a throwing lane",
    ),
    (
        "goal",
        "a touchdown, the whole stadium on its feet as the play pays off",
    ),
    (
        "keeper",
        "a free safety playing centerfield, the last line of defense against the deep ball",
    ),
    (
        "pass",
        "a well-timed throw hitting a receiver in stride between defenders",
    ),
];

const STUB_GENERIC: &str =
    "a play developing between the twenty-yard lines, both units jockeying for field position";

/// Deterministic stub transform of commentary into an NFL analogy.
///
/// Zero latency, no network, same input always yields the same output.
pub fn stub_analogy(commentary: &str) -> String {
    let lower = commentary.to_lowercase();
    let analogy = STUB_MAPPINGS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, analogy)| *analogy)
        .unwrap_or(STUB_GENERIC);
    format!("In NFL terms, this is like {}.", analogy)
}

const ANALOGY_PROMPT: &str = "You are explaining soccer to an American-football fan. \
Rewrite the following soccer commentary as a one or two sentence NFL analogy that \
captures the same tactical situation. Respond with the analogy only.\n\nCommentary: ";

/// Generates NFL analogies for soccer commentary.
pub struct AnalogyGenerator {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl AnalogyGenerator {
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

    /// Whether the AI-backed mode is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate an analogy for the commentary.
    ///
    /// Without an API key this is the deterministic stub and never touches
    /// the network. With a key, errors propagate so the caller can apply
    /// the stub itself.
    pub async fn generate(&self, commentary: &str) -> AiResult<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No API key, using stub analogy");
            return Ok(stub_analogy(commentary));
        };

        let request = MessagesRequest {
            model: ANALOGY_MODEL.to_string(),
            max_tokens: ANALOGY_MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock::Text {
                    text: format!("{}{}", ANALOGY_PROMPT, commentary),
                }],
            }],
        };

        let analogy = send_messages(&self.http, &self.base_url, api_key, &request).await?;
        info!(chars = analogy.len(), "Analogy generated");
        Ok(analogy)
    }
}
