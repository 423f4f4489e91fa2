//! Text-insight generator abstraction and implementations.
//!
//! Supports `OpenAI` chat completions, Anthropic messages and Google Gemini
//! `generateContent` behind a common trait.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use serde::Deserialize;

use crate::AiError;

/// Temperature sent with every summary request.
pub const TEMPERATURE: f32 = 0.7;

/// Opaque text generation.
#[async_trait::async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Short provider name for logs and result metadata.
    fn name(&self) -> &str;

    /// Generates text for `prompt`, capped at `max_tokens`.
    ///
    /// Returns `Ok(None)` when the provider answered but produced no text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the provider rejects it.
    async fn summarize(&self, prompt: &str, max_tokens: u32) -> Result<Option<String>, AiError>;
}

/// Creates a generator from process environment variables.
///
/// See [`create_generator_with`] for the variables consulted.
///
/// # Errors
///
/// Returns [`AiError::Config`] if `AI_PROVIDER` names an unknown provider
/// or one whose API key is not set.
pub fn create_generator_from_env() -> Result<Option<Box<dyn InsightGenerator>>, AiError> {
    create_generator_with(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}

/// Creates a generator from variables resolved by `lookup`.
///
/// If `AI_PROVIDER` is set, uses that provider (`openai`/`chatgpt`,
/// `anthropic`/`claude`, `gemini`). Otherwise auto-detects from the first
/// key present among `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and
/// `GEMINI_API_KEY`. `AI_MODEL` overrides the provider's default model.
///
/// Returns `Ok(None)` when no provider is requested and no key is found;
/// the pipeline then always uses its local summary.
///
/// # Errors
///
/// Returns [`AiError::Config`] if the requested provider is unknown or its
/// key is missing.
pub fn create_generator_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<Box<dyn InsightGenerator>>, AiError> {
    let Some(provider) = lookup("AI_PROVIDER").or_else(|| detect_provider(&lookup)) else {
        log::info!(
            "No insight generator configured. Set one of OPENAI_API_KEY, \
             ANTHROPIC_API_KEY or GEMINI_API_KEY to enable generated summaries."
        );
        return Ok(None);
    };

    let model = lookup("AI_MODEL");
    let require = |var: &str| {
        lookup(var).ok_or_else(|| AiError::Config {
            message: format!("{var} environment variable not set"),
        })
    };

    let generator: Box<dyn InsightGenerator> = match provider.to_lowercase().as_str() {
        "openai" | "chatgpt" | "gpt" => Box::new(openai::OpenAiGenerator::new(
            require("OPENAI_API_KEY")?,
            model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
        )),
        "anthropic" | "claude" => Box::new(anthropic::AnthropicGenerator::new(
            require("ANTHROPIC_API_KEY")?,
            model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string()),
        )),
        "gemini" | "google" => Box::new(gemini::GeminiGenerator::new(
            require("GEMINI_API_KEY")?,
            model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
        )),
        other => {
            return Err(AiError::Config {
                message: format!(
                    "Unknown AI provider: {other}. Use 'openai', 'anthropic', or 'gemini'."
                ),
            });
        }
    };

    Ok(Some(generator))
}

/// Picks a provider from whichever API key is present.
fn detect_provider(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    for (var, provider, label) in [
        ("OPENAI_API_KEY", "openai", "OpenAI"),
        ("ANTHROPIC_API_KEY", "anthropic", "Anthropic"),
        ("GEMINI_API_KEY", "gemini", "Gemini"),
    ] {
        if lookup(var).is_some() {
            log::info!("Auto-detected AI provider: {label} ({var} found)");
            return Some(provider.to_string());
        }
    }
    None
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turns a non-success response into [`AiError::Provider`], preferring the
/// `error.message` field all three APIs use.
fn provider_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<ApiError>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
    AiError::Provider { message }
}

/// Trims generated text, mapping blank output to `None`.
fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_keys_means_no_generator() {
        assert!(create_generator_with(env(&[])).unwrap().is_none());
    }

    #[test]
    fn detects_in_key_order() {
        let g = create_generator_with(env(&[
            ("GEMINI_API_KEY", "g"),
            ("ANTHROPIC_API_KEY", "a"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(g.name(), "anthropic");

        let g = create_generator_with(env(&[
            ("GEMINI_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(g.name(), "openai");
    }

    #[test]
    fn explicit_provider_wins_and_aliases_resolve() {
        let g = create_generator_with(env(&[
            ("AI_PROVIDER", "Claude"),
            ("OPENAI_API_KEY", "o"),
            ("ANTHROPIC_API_KEY", "a"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(g.name(), "anthropic");

        let g = create_generator_with(env(&[("AI_PROVIDER", "chatgpt"), ("OPENAI_API_KEY", "o")]))
            .unwrap()
            .unwrap();
        assert_eq!(g.name(), "openai");
    }

    #[test]
    fn explicit_provider_without_key_is_config_error() {
        let err = create_generator_with(env(&[("AI_PROVIDER", "gemini")])).err();
        assert!(matches!(err, Some(AiError::Config { message }) if message.contains("GEMINI_API_KEY")));
    }

    #[test]
    fn unknown_provider_is_config_error() {
        assert!(matches!(
            create_generator_with(env(&[("AI_PROVIDER", "bard")])),
            Err(AiError::Config { .. })
        ));
    }

    #[test]
    fn error_body_message_is_extracted() {
        let err = provider_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "invalid api key", "type": "auth"}}"#,
        );
        assert!(matches!(err, AiError::Provider { message } if message == "invalid api key"));

        let err = provider_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, AiError::Provider { message } if message.contains("502")));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(non_blank(Some("  \n".to_string())), None);
        assert_eq!(non_blank(Some(" ok ".to_string())), Some("ok".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
