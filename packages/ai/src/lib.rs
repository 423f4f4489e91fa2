#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident analysis pipeline and text-insight generators.
//!
//! [`pipeline::AnalysisPipeline`] clusters a report snapshot, scores it,
//! profiles it in time and space, and optionally asks an
//! [`providers::InsightGenerator`] (`OpenAI`, Anthropic or Gemini) for a
//! narrative summary. Generator failures never fail an analysis: a
//! deterministic summary is substituted instead. Configuration is an
//! explicit [`config::AnalysisConfig`] passed in at construction.

pub mod config;
pub mod pipeline;
pub mod providers;

use thiserror::Error;

pub use config::AnalysisConfig;
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, PipelineError, PipelineState};
pub use providers::{InsightGenerator, create_generator_from_env};

/// Errors that can occur while talking to a text-insight generator.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// The provider did not answer in time.
    #[error("Insight generation timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },
}
