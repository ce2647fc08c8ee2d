//! Web search via SerpAPI.
//!
//! Queries the SerpAPI JSON endpoint (Google engine by default) and maps the
//! `organic_results` array onto [`SearchResult`]s. The API key travels in the
//! query string, so request errors are stripped of their URL before they are
//! logged or returned.

use async_trait::async_trait;
use briefbot_core::adapters::SearchProvider;
use briefbot_core::config::SearchConfig;
use briefbot_core::error::FlowError;
use briefbot_core::types::SearchResult;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// SerpAPI's error text for a query with no organic results.
const NO_RESULTS_ERROR: &str = "Google hasn't returned any results for this query.";

/// [`SearchProvider`] backed by SerpAPI.
pub struct SerpApiSearch {
    client: reqwest::Client,
    endpoint: String,
    engine: String,
    api_key: String,
}

impl SerpApiSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, FlowError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("Briefbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlowError::SearchUnavailable {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            engine: config.engine.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self, topic: &str, limit: usize) -> String {
        format!(
            "{}?engine={}&q={}&num={}&api_key={}",
            self.endpoint,
            urlencoding::encode(&self.engine),
            urlencoding::encode(topic),
            limit,
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Map a SerpAPI response body onto at most `limit` results.
///
/// Results without a link are skipped. A body whose `error` is SerpAPI's
/// "no results" message yields an empty list; any other `error` is a failure.
pub fn parse_organic_results(body: &Value, limit: usize) -> Result<Vec<SearchResult>, FlowError> {
    if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
        if error == NO_RESULTS_ERROR {
            return Ok(Vec::new());
        }
        return Err(FlowError::SearchUnavailable {
            message: format!("SerpAPI error: {}", error),
        });
    }

    let Some(organic) = body.get("organic_results").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let results = organic
        .iter()
        .filter_map(|item| {
            let url = item.get("link").and_then(|v| v.as_str())?;
            let title = item.get("title").and_then(|v| v.as_str()).unwrap_or(url);
            let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            Some(SearchResult::new(title, snippet, url))
        })
        .take(limit)
        .collect();
    Ok(results)
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<SearchResult>, FlowError> {
        let unavailable = |message: String| FlowError::SearchUnavailable { message };

        let response = self
            .client
            .get(self.request_url(topic, limit))
            .send()
            .await
            .map_err(|e| unavailable(format!("Search request failed: {}", e.without_url())))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| unavailable(format!("Failed to parse search response: {}", e.without_url())))?;

        if !status.is_success() && body.get("error").is_none() {
            return Err(unavailable(format!("HTTP {} from SerpAPI", status)));
        }

        let results = parse_organic_results(&body, limit)?;
        debug!(count = results.len(), limit, "Search completed");
        Ok(results)
    }
}
