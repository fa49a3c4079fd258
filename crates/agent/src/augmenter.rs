//! Decides when a user message should be enriched with web search results,
//! and splices those results into the prompt text.

/// Trigger terms used when none are configured.
pub const DEFAULT_TRIGGER_TERMS: &[&str] =
    &["search", "latest", "current", "news", "what's happening"];

#[derive(Debug, Clone)]
pub struct SearchAugmenter {
    triggers: Vec<String>,
}

impl Default for SearchAugmenter {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_TERMS.iter().copied())
    }
}

impl SearchAugmenter {
    /// Build from a set of trigger terms. Matching is case-insensitive;
    /// blank terms are ignored.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let triggers = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { triggers }
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Whether `user_text` contains any trigger term.
    pub fn should_augment(&self, user_text: &str) -> bool {
        let lowered = user_text.to_lowercase();
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }

    /// Append search results to `user_text`.
    ///
    /// Text without a trigger term, or a missing/blank result, comes back
    /// unchanged.
    pub fn augment(&self, user_text: &str, search_result: Option<&str>) -> String {
        match search_result.map(str::trim) {
            Some(result) if !result.is_empty() && self.should_augment(user_text) => {
                format!("{user_text}\n\nWeb search results:\n{result}")
            }
            _ => user_text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_triggers_match_case_insensitively() {
        let augmenter = SearchAugmenter::default();
        assert!(augmenter.should_augment("search for latest python news"));
        assert!(augmenter.should_augment("What's Happening in Rust?"));
        assert!(augmenter.should_augment("CURRENT events"));
        assert!(!augmenter.should_augment("hello there"));
        assert!(!augmenter.should_augment(""));
    }

    #[test]
    fn substring_match() {
        // "research" contains "search"
        assert!(SearchAugmenter::default().should_augment("do some research"));
    }

    #[test]
    fn augment_appends_results() {
        let augmenter = SearchAugmenter::default();
        let out = augmenter.augment("latest rust release", Some("Rust 1.88 is out"));
        assert_eq!(out, "latest rust release\n\nWeb search results:\nRust 1.88 is out");
    }

    #[test]
    fn augment_without_result_is_identity() {
        let augmenter = SearchAugmenter::default();
        assert_eq!(augmenter.augment("latest news", None), "latest news");
        assert_eq!(augmenter.augment("latest news", Some("   ")), "latest news");
    }

    #[test]
    fn augment_is_identity_for_non_trigger_text() {
        let augmenter = SearchAugmenter::default();
        for text in ["hello", "tell me a joke", ""] {
            assert_eq!(augmenter.augment(text, Some("irrelevant results")), text);
        }
    }

    #[test]
    fn configured_terms_replace_defaults() {
        let augmenter = SearchAugmenter::new(["Lookup", "  ", "stock price"]);
        assert_eq!(augmenter.triggers(), ["lookup", "stock price"]);
        assert!(augmenter.should_augment("LOOKUP the weather"));
        assert!(!augmenter.should_augment("latest news"));
    }

    #[test]
    fn no_terms_never_triggers() {
        let augmenter = SearchAugmenter::new(Vec::<String>::new());
        assert!(!augmenter.should_augment("search latest news"));
    }
}
