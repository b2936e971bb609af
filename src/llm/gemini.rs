//! Gemini `generateContent` client.

use serde::{Deserialize, Serialize};

use super::{LlmError, TextGenerator};
use crate::config::LlmConfig;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Thin client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Build a client from config. The API key comes from the `GEMINI_API_KEY`
    /// environment variable or the `[llm] api_key` setting.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate, trimmed.
fn extract_candidate_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let parts = &candidate.content.as_ref()?.parts;
    let text: String = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "calling Gemini");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_candidate_text(&parsed).ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_rejected_at_construction() {
        let config = LlmConfig {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            api_key: None,
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(LlmError::MissingApiKey)
        ));

        let config = LlmConfig {
            api_key: Some(String::new()),
            ..config
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn extracts_first_candidate_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "なぜ"}, {"text": "止まってるんだ？"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            extract_candidate_text(&response).as_deref(),
            Some("なぜ止まってるんだ？")
        );
    }

    #[test]
    fn blank_candidates_yield_none() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "  \n"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(extract_candidate_text(&response).is_none());

        let response: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_candidate_text(&response).is_none());
    }
}
