//! Web search tool backed by the Serper API.
//!
//! Formats up to `max_results` organic results plus an optional knowledge
//! graph block and related search terms into plain text for the reasoning
//! loop. Every failure mode maps to a distinct user-facing message behind a
//! common failure marker, categorized as timeout / quota-or-auth / other
//! HTTP error / network error / unexpected error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::ToolError;

use super::Tool;

/// Serper search endpoint.
const SEARCH_URL: &str = "https://google.serper.dev/search";

/// Network timeout for a single search request.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum allowed query length in characters.
const MAX_QUERY_LEN: usize = 500;

/// Prefix carried by every failure message.
const FAILURE_MARKER: &str = "Search failed:";

/// Web search tool using the Serper API.
pub struct SearchTool {
    api_key: Option<String>,
    max_results: usize,
    http_client: Client,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("max_results", &self.max_results)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl SearchTool {
    /// Creates a search tool limited to `max_results` organic results.
    pub fn new(api_key: Option<String>, max_results: usize) -> Self {
        Self {
            api_key,
            max_results,
            http_client: Client::builder()
                .timeout(SEARCH_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Creates a search tool from settings.
    pub fn from_settings(settings: &Settings, max_results: usize) -> Self {
        Self::new(settings.serper_api_key.clone(), max_results)
    }

    async fn run_search(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() || query.chars().count() > MAX_QUERY_LEN {
            return Err(ToolError::InvalidInput(format!(
                "query must be 1-{} characters",
                MAX_QUERY_LEN
            )));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredentials("SERPER_API_KEY".to_string()))?;

        tracing::info!(query = %truncate(query, 50), "Running web search");

        let payload = SearchPayload {
            q: query,
            num: self.max_results,
        };

        let response = self
            .http_client
            .post(SEARCH_URL)
            .header("X-API-KEY", api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        seconds: SEARCH_TIMEOUT.as_secs(),
                    }
                } else {
                    ToolError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Http {
                status: status.as_u16(),
            });
        }

        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| ToolError::Unexpected(format!("malformed search response: {}", e)))?;

        tracing::info!(results = results.organic.len(), "Search completed");
        Ok(self.format_results(&results))
    }

    /// Formats API results into readable text.
    fn format_results(&self, results: &SearchResults) -> String {
        let mut parts = Vec::new();

        if let Some(kg) = &results.knowledge_graph {
            parts.push(format!(
                "Knowledge Graph\nTitle: {}\nType: {}\nDescription: {}\n",
                kg.title.as_deref().unwrap_or("N/A"),
                kg.entity_type.as_deref().unwrap_or("N/A"),
                kg.description.as_deref().unwrap_or("N/A"),
            ));
        }

        if !results.organic.is_empty() {
            parts.push("Search Results\n".to_string());
            for (i, result) in results.organic.iter().take(self.max_results).enumerate() {
                parts.push(format!(
                    "{}. {}\nLink: {}\nSnippet: {}\n",
                    i + 1,
                    result.title.as_deref().unwrap_or("No Title"),
                    result.link.as_deref().unwrap_or("No link"),
                    result.snippet.as_deref().unwrap_or("No description"),
                ));
            }
        }

        if !results.related_searches.is_empty() {
            let terms: Vec<&str> = results
                .related_searches
                .iter()
                .take(5)
                .filter_map(|r| r.query.as_deref())
                .collect();
            if !terms.is_empty() {
                parts.push(format!("Related Searches: {}\n", terms.join(", ")));
            }
        }

        if parts.is_empty() {
            return "No results found for this search query.".to_string();
        }

        parts.join("\n")
    }

    /// Maps an internal error to its user-facing failure message.
    fn failure_message(error: &ToolError) -> String {
        match error {
            ToolError::Timeout { .. } => {
                format!("{} Request timed out. Please try again.", FAILURE_MARKER)
            }
            ToolError::Http { status: 403 } => {
                format!("{} Invalid API key or quota exceeded", FAILURE_MARKER)
            }
            ToolError::Http { status } => {
                format!("{} HTTP error {}", FAILURE_MARKER, status)
            }
            ToolError::Network(_) => {
                format!(
                    "{} Network error. Please check your connection.",
                    FAILURE_MARKER
                )
            }
            ToolError::MissingCredentials(_) => {
                format!("{} Serper API key not configured", FAILURE_MARKER)
            }
            other => format!("{} {}", FAILURE_MARKER, other),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the internet for current information on any topic. \
         Returns relevant web results with titles, links, and snippets."
    }

    async fn invoke(&self, input: &str) -> String {
        match self.run_search(input).await {
            Ok(formatted) => formatted,
            Err(e) => {
                tracing::error!(error = %e, "Web search failed");
                Self::failure_message(&e)
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[derive(Debug, Serialize)]
struct SearchPayload<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "knowledgeGraph")]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(rename = "relatedSearches", default)]
    related_searches: Vec<RelatedSearch>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    #[serde(rename = "type")]
    entity_type: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelatedSearch {
    query: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> SearchResults {
        serde_json::from_value(serde_json::json!({
            "knowledgeGraph": {
                "title": "Electric vehicle",
                "type": "Topic",
                "description": "A vehicle propelled by electric motors."
            },
            "organic": [
                {"title": "EV trends 2025", "link": "https://example.com/a", "snippet": "Battery costs fall."},
                {"title": "Solid state outlook", "link": "https://example.com/b", "snippet": "Pilot lines ramp."},
                {"title": "Charging networks", "link": "https://example.com/c", "snippet": "Coverage expands."}
            ],
            "relatedSearches": [
                {"query": "ev battery prices"},
                {"query": "solid state batteries"}
            ]
        }))
        .expect("sample should deserialize")
    }

    #[test]
    fn format_includes_all_sections() {
        let tool = SearchTool::new(Some("key".to_string()), 3);
        let text = tool.format_results(&sample_results());

        assert!(text.contains("Knowledge Graph"));
        assert!(text.contains("Electric vehicle"));
        assert!(text.contains("1. EV trends 2025"));
        assert!(text.contains("https://example.com/a"));
        assert!(text.contains("Related Searches: ev battery prices, solid state batteries"));
    }

    #[test]
    fn format_caps_organic_results() {
        let tool = SearchTool::new(Some("key".to_string()), 2);
        let text = tool.format_results(&sample_results());

        assert!(text.contains("2. Solid state outlook"));
        assert!(!text.contains("3. Charging networks"));
    }

    #[test]
    fn format_handles_empty_results() {
        let tool = SearchTool::new(Some("key".to_string()), 5);
        let empty: SearchResults = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(
            tool.format_results(&empty),
            "No results found for this search query."
        );
    }

    #[tokio::test]
    async fn invoke_without_key_returns_failure_text() {
        let tool = SearchTool::new(None, 5);
        let output = tool.invoke("electric vehicles").await;
        assert_eq!(output, "Search failed: Serper API key not configured");
    }

    #[tokio::test]
    async fn invoke_rejects_empty_and_oversized_queries() {
        let tool = SearchTool::new(Some("key".to_string()), 5);

        let output = tool.invoke("   ").await;
        assert!(output.starts_with("Search failed:"), "got: {}", output);

        let oversized = "q".repeat(501);
        let output = tool.invoke(&oversized).await;
        assert!(output.starts_with("Search failed:"), "got: {}", output);
    }

    #[test]
    fn failure_messages_are_distinct_per_category() {
        let timeout = SearchTool::failure_message(&ToolError::Timeout { seconds: 30 });
        let quota = SearchTool::failure_message(&ToolError::Http { status: 403 });
        let http = SearchTool::failure_message(&ToolError::Http { status: 500 });
        let network = SearchTool::failure_message(&ToolError::Network("refused".into()));
        let unexpected = SearchTool::failure_message(&ToolError::Unexpected("odd".into()));

        let all = [&timeout, &quota, &http, &network, &unexpected];
        for message in all {
            assert!(message.starts_with("Search failed:"));
        }
        assert!(timeout.contains("timed out"));
        assert!(quota.contains("quota"));
        assert!(http.contains("500"));
        assert!(network.contains("Network error"));
    }
}
