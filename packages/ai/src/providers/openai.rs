//! `OpenAI` chat-completions generator.

use serde::{Deserialize, Serialize};

use super::{InsightGenerator, TEMPERATURE, non_blank, provider_error};
use crate::AiError;

/// Model used when `AI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o";

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// `OpenAI` API generator.
pub struct OpenAiGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Creates a new `OpenAI` generator.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: [OpenAiMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

impl OpenAiResponse {
    /// `choices[0].message.content`.
    fn into_text(self) -> Option<String> {
        non_blank(self.choices.into_iter().next()?.message.content)
    }
}

#[async_trait::async_trait]
impl InsightGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn summarize(&self, prompt: &str, max_tokens: u32) -> Result<Option<String>, AiError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: [OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let resp = self
            .client
            .post(ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(provider_error(status, &body));
        }

        let response: OpenAiResponse = serde_json::from_str(&body)?;
        Ok(response.into_text())
    }
}
