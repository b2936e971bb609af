//! Text generation via an injected capability.
//!
//! Provides the [`TextGenerator`] trait and a Gemini-backed implementation.
//! The generator is created via [`create_generator`] from configuration and
//! handed to callers as a trait object — nothing in the crate talks to a
//! global client, so tests substitute scripted doubles freely.

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the text-generation collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key in config or environment.
    #[error("missing API key — set GEMINI_API_KEY or [llm] api_key")]
    MissingApiKey,

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered successfully but carried no usable text.
    #[error("empty response from model")]
    EmptyResponse,
}

/// Single prompt in, single text out. All conversation context is flattened
/// into the prompt by the caller; the generator holds no multi-turn state.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Create a text generator from config.
///
/// Currently only `"gemini"` is supported.
pub fn create_generator(
    config: &crate::config::LlmConfig,
) -> anyhow::Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "gemini" => {
            let client = gemini::GeminiClient::new(config)?;
            Ok(Box::new(client))
        }
        other => anyhow::bail!("unknown llm provider: {other}. Supported: gemini"),
    }
}
