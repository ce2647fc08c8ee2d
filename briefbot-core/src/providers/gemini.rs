//! Google Gemini summarization provider.
//!
//! Calls the `generateContent` endpoint with a single user turn containing
//! the summarization prompt. Auth is via the `?key=API_KEY` query parameter.

use super::{build_summary_prompt, parse_bullets};
use crate::adapters::Summarizer;
use crate::config::LlmConfig;
use crate::error::FlowError;
use crate::types::Summary;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// The default Google Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-backed [`Summarizer`].
pub struct GeminiSummarizer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiSummarizer {
    /// Create a summarizer from configuration.
    ///
    /// Returns `SummarizationUnavailable` if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, FlowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FlowError::SummarizationUnavailable {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build the endpoint URL for a Gemini API call.
    fn endpoint_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    /// Build the JSON request body for the Gemini API.
    fn build_request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature
            }
        })
    }

    /// Concatenate the text parts of the first candidate.
    fn parse_response(body: &Value) -> Result<String, FlowError> {
        let candidates = body["candidates"]
            .as_array()
            .ok_or_else(|| FlowError::SummarizationUnavailable {
                message: "Missing 'candidates' array in response".to_string(),
            })?;

        let candidate = candidates
            .first()
            .ok_or_else(|| FlowError::SummarizationUnavailable {
                message: "Empty 'candidates' array in response".to_string(),
            })?;

        let parts = candidate["content"]["parts"]
            .as_array()
            .ok_or_else(|| FlowError::SummarizationUnavailable {
                message: "Missing 'parts' array in candidate content".to_string(),
            })?;

        let text = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }

    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> FlowError {
        let message = match status.as_u16() {
            401 | 403 => "authentication failed for Gemini".to_string(),
            429 => "rate limited by Gemini".to_string(),
            _ => format!("HTTP {} from Gemini API: {}", status, body_text),
        };
        FlowError::SummarizationUnavailable { message }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, topic: &str, snippets: &[String]) -> Result<Summary, FlowError> {
        let prompt = build_summary_prompt(topic, snippets);
        let body = self.build_request_body(&prompt);
        let url = self.endpoint_url("generateContent");

        debug!(
            model = self.model.as_str(),
            snippets = snippets.len(),
            "Sending Gemini summarization request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::SummarizationUnavailable {
                message: format!("Request to Gemini API failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| FlowError::SummarizationUnavailable {
                message: format!("Failed to read response body: {}", e.without_url()),
            })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| FlowError::SummarizationUnavailable {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        let text = Self::parse_response(&response_json)?;
        let bullets = parse_bullets(&text);
        if bullets.is_empty() {
            return Err(FlowError::SummarizationUnavailable {
                message: "Model returned no usable summary text".to_string(),
            });
        }

        Ok(Summary::new(topic, bullets))
    }
}
