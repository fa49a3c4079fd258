//! Search trait: where augmentation snippets come from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;

/// What a successful search produced.
///
/// Kept apart from [`SearchError`] so callers can tell "nothing found" from
/// "the call failed", even though the orchestrator treats both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Formatted, human-readable result text
    Results(String),
    /// The service answered but had nothing to say
    Empty,
}

impl SearchOutcome {
    /// The result text, if there is any non-blank text.
    pub fn into_text(self) -> Option<String> {
        match self {
            SearchOutcome::Results(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// The backend name (e.g., "duckduckgo").
    fn name(&self) -> &str;

    /// Run a query and return formatted results.
    async fn search(&self, query: &str) -> std::result::Result<SearchOutcome, SearchError>;
}
