//! Web search via the DuckDuckGo Instant Answer API.
//!
//! The API returns structured "instant answers" (abstracts, definitions,
//! related topics, infobox facts) rather than a ranked page list. Those are
//! flattened into a short plain-text block suitable for pasting into a
//! prompt. When nothing useful comes back the client can fall back to a link
//! to the HTML results page.

use async_trait::async_trait;
use jarvis_config::SearchConfig;
use jarvis_core::error::SearchError;
use jarvis_core::search::{SearchOutcome, SearchProvider};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const HTML_SEARCH_URL: &str = "https://duckduckgo.com/html/";
const INFOBOX_ITEMS: usize = 3;

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
    link_fallback: bool,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: impl Into<String>, max_results: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Jarvis/", env!("CARGO_PKG_VERSION"), " (AI Assistant)"))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
            max_results,
            link_fallback: true,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            &config.base_url,
            config.max_results,
            Duration::from_secs(config.timeout_secs),
        )
        .with_link_fallback(config.link_fallback)
    }

    /// Whether an answer-less query yields a results-page link or `Empty`.
    pub fn with_link_fallback(mut self, enabled: bool) -> Self {
        self.link_fallback = enabled;
        self
    }

    /// Run `query`, listing at most `max_results` related topics.
    pub async fn search_with_limit(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<SearchOutcome, SearchError> {
        debug!(query = %query, max_results, "Querying DuckDuckGo");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        // DuckDuckGo answers with `application/x-javascript`, so decode by hand.
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let data: Value =
            serde_json::from_str(&body).map_err(|e| SearchError::Parse(e.to_string()))?;

        match format_results(&data, max_results) {
            Some(text) => Ok(SearchOutcome::Results(text)),
            None if self.link_fallback => Ok(SearchOutcome::Results(fallback_link(query))),
            None => Ok(SearchOutcome::Empty),
        }
    }

    /// Recent news on `topic`.
    pub async fn news(&self, topic: &str) -> Result<SearchOutcome, SearchError> {
        self.search_with_limit(&news_query(topic), self.max_results).await
    }

    /// Current weather for `location`.
    pub async fn weather(&self, location: &str) -> Result<SearchOutcome, SearchError> {
        self.search_with_limit(&weather_query(location), 1).await
    }

    /// Definition of `term`.
    pub async fn definition(&self, term: &str) -> Result<SearchOutcome, SearchError> {
        self.search_with_limit(&definition_query(term), 1).await
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        self.search_with_limit(query, self.max_results).await
    }
}

pub fn news_query(topic: &str) -> String {
    let topic = topic.trim();
    let topic = if topic.is_empty() { "technology" } else { topic };
    format!("{topic} news latest")
}

pub fn weather_query(location: &str) -> String {
    format!("weather {}", location.trim())
}

pub fn definition_query(term: &str) -> String {
    format!("define {}", term.trim())
}

/// Flatten an Instant Answer payload into text, or `None` if it carries
/// nothing worth showing.
fn format_results(data: &Value, max_results: usize) -> Option<String> {
    let mut lines = Vec::new();

    if let Some(answer) = non_empty_str(data, "Answer") {
        lines.push(format!("Answer: {answer}"));
    }

    if let Some(summary) = non_empty_str(data, "Abstract") {
        lines.push(format!("Summary: {summary}"));
        if let Some(url) = non_empty_str(data, "AbstractURL") {
            lines.push(format!("Source: {url}"));
        }
    }

    if let Some(definition) = non_empty_str(data, "Definition") {
        lines.push(format!("Definition: {definition}"));
        if let Some(url) = non_empty_str(data, "DefinitionURL") {
            lines.push(format!("Source: {url}"));
        }
    }

    let topics: Vec<&Value> = data
        .get("RelatedTopics")
        .and_then(Value::as_array)
        .map(|topics| topics.iter().take(max_results).collect())
        .unwrap_or_default();
    if !topics.is_empty() {
        lines.push("Related Information:".into());
        // Grouped topics (no "Text") are skipped.
        for topic in topics {
            if let Some(text) = non_empty_str(topic, "Text") {
                lines.push(format!("- {text}"));
                if let Some(url) = non_empty_str(topic, "FirstURL") {
                    lines.push(format!("  Source: {url}"));
                }
            }
        }
    }

    let infobox: Vec<(&str, String)> = data
        .pointer("/Infobox/content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(INFOBOX_ITEMS)
                .filter_map(|item| {
                    let label = non_empty_str(item, "label")?;
                    let value = match item.get("value")? {
                        Value::String(s) if !s.is_empty() => s.clone(),
                        Value::String(_) | Value::Null => return None,
                        other => other.to_string(),
                    };
                    Some((label, value))
                })
                .collect()
        })
        .unwrap_or_default();
    if !infobox.is_empty() {
        lines.push("Additional Information:".into());
        for (label, value) in infobox {
            lines.push(format!("- {label}: {value}"));
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn fallback_link(query: &str) -> String {
    let url = reqwest::Url::parse_with_params(HTML_SEARCH_URL, &[("q", query)])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| HTML_SEARCH_URL.to_string());
    format!("Web search performed for: '{query}'. For detailed results, please visit: {url}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_every_section() {
        let data = json!({
            "Answer": "42",
            "Abstract": "Python is a programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Python",
            "Definition": "A large snake.",
            "DefinitionURL": "https://example.com/python",
            "RelatedTopics": [
                { "Text": "Python 3.13 released", "FirstURL": "https://python.org" },
                { "Text": "PyPI" }
            ],
            "Infobox": { "content": [
                { "label": "Designed by", "value": "Guido van Rossum" },
                { "label": "First appeared", "value": 1991 }
            ]}
        });

        let text = format_results(&data, 5).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Answer: 42");
        assert_eq!(lines[1], "Summary: Python is a programming language.");
        assert_eq!(lines[2], "Source: https://en.wikipedia.org/wiki/Python");
        assert_eq!(lines[3], "Definition: A large snake.");
        assert!(text.contains("Related Information:\n- Python 3.13 released\n  Source: https://python.org\n- PyPI"));
        assert!(text.contains("Additional Information:\n- Designed by: Guido van Rossum\n- First appeared: 1991"));
    }

    #[test]
    fn related_topics_respect_limit() {
        let topics: Vec<Value> = (0..10)
            .map(|i| json!({ "Text": format!("topic {i}") }))
            .collect();
        let data = json!({ "RelatedTopics": topics });

        let text = format_results(&data, 3).unwrap();
        assert!(text.contains("- topic 2"));
        assert!(!text.contains("- topic 3"));
    }

    #[test]
    fn infobox_limited_to_three_items() {
        let items: Vec<Value> = (0..6)
            .map(|i| json!({ "label": format!("l{i}"), "value": format!("v{i}") }))
            .collect();
        let data = json!({ "Infobox": { "content": items } });

        let text = format_results(&data, 5).unwrap();
        assert!(text.contains("- l2: v2"));
        assert!(!text.contains("l3"));
    }

    #[test]
    fn empty_payload_has_no_results() {
        let data = json!({ "Answer": "", "Abstract": "", "RelatedTopics": [], "Infobox": "" });
        assert!(format_results(&data, 5).is_none());
    }

    #[test]
    fn fallback_link_encodes_query() {
        let text = fallback_link("rust & tokio");
        assert!(text.starts_with("Web search performed for: 'rust & tokio'"));
        assert!(text.contains("https://duckduckgo.com/html/?q=rust+%26+tokio"));
    }

    #[test]
    fn convenience_queries() {
        assert_eq!(news_query("AI"), "AI news latest");
        assert_eq!(news_query(""), "technology news latest");
        assert_eq!(weather_query(" New York "), "weather New York");
        assert_eq!(definition_query("artificial intelligence"), "define artificial intelligence");
    }

    #[test]
    fn from_config_copies_settings() {
        let config = SearchConfig {
            max_results: 2,
            link_fallback: false,
            ..SearchConfig::default()
        };
        let search = DuckDuckGoSearch::from_config(&config);
        assert_eq!(search.max_results, 2);
        assert!(!search.link_fallback);
        assert_eq!(search.name(), "duckduckgo");
    }
}
