//! Anthropic messages generator.

use serde::{Deserialize, Serialize};

use super::{InsightGenerator, TEMPERATURE, non_blank, provider_error};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic API generator.
pub struct AnthropicGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    /// Creates a new Anthropic generator.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [AnthropicMessage<'a>; 1],
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicResponse {
    /// All text blocks joined in order.
    fn into_text(self) -> Option<String> {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        non_blank(Some(text))
    }
}

#[async_trait::async_trait]
impl InsightGenerator for AnthropicGenerator {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn summarize(&self, prompt: &str, max_tokens: u32) -> Result<Option<String>, AiError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens,
            temperature: TEMPERATURE,
            messages: [AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(ENDPOINT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)?;
        Ok(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_blocks() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"id": "msg_1", "content": [
                {"type": "text", "text": "Executive summary."},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Key findings."}
            ], "stop_reason": "end_turn"}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_text().as_deref(),
            Some("Executive summary.\nKey findings.")
        );
    }

    #[test]
    fn empty_content_is_none() {
        let response: AnthropicResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(response.into_text().is_none());
    }
}
