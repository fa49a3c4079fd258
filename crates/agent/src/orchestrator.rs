//! One conversational turn, end to end.

use std::sync::Arc;
use jarvis_config::AppConfig;
use jarvis_core::memory::ConversationTurn;
use jarvis_core::provider::{Provider, ProviderRequest};
use jarvis_core::search::SearchProvider;
use jarvis_memory::MemoryLog;
use tracing::{debug, info, warn};

use crate::augmenter::SearchAugmenter;
use crate::prompt::PromptBuilder;

/// Reply returned (and logged) whenever the language model cannot produce one.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again.";

/// Drives a single turn: optional search augmentation, prompt assembly,
/// one model call, and exactly one log append.
pub struct TurnOrchestrator {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to request
    model: String,

    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,

    /// Shared conversation log
    memory: Arc<MemoryLog>,

    augmenter: SearchAugmenter,

    /// Web search; augmentation is skipped when absent
    search: Option<Arc<dyn SearchProvider>>,

    /// How many past turns go into each prompt
    history_turns: usize,
}

impl TurnOrchestrator {
    /// Create an orchestrator with default triggers, no search, and a
    /// history window equal to the log capacity.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        memory: Arc<MemoryLog>,
    ) -> Self {
        let history_turns = memory.capacity();
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            memory,
            augmenter: SearchAugmenter::default(),
            search: None,
            history_turns,
        }
    }

    /// Create an orchestrator with prompt, sampling, trigger, and history
    /// settings taken from `config`. Search is attached separately.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        memory: Arc<MemoryLog>,
    ) -> Self {
        Self::new(provider, model, config.identity.system_prompt(), memory)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_history_turns(config.memory.history_turns)
            .with_augmenter(SearchAugmenter::new(&config.search.trigger_terms))
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_augmenter(mut self, augmenter: SearchAugmenter) -> Self {
        self.augmenter = augmenter;
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// The conversation log this orchestrator writes to.
    pub fn memory(&self) -> &Arc<MemoryLog> {
        &self.memory
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Process one user message and return the reply.
    ///
    /// Never fails: search problems degrade to an unaugmented prompt and
    /// model problems yield [`FALLBACK_REPLY`]. Either way the turn is
    /// appended to the log exactly once.
    pub async fn process(&self, user_text: &str) -> String {
        let search_result = self.search_for(user_text).await;
        let enhanced = self.augmenter.augment(user_text, search_result.as_deref());

        let history = self.memory.recent(self.history_turns).await;
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: PromptBuilder::build(&self.system_prompt, &history, &enhanced),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            history = history.len(),
            augmented = search_result.is_some(),
            "Calling language model"
        );

        let reply = match self.provider.complete(request).await {
            Ok(response) if !response.message.content.trim().is_empty() => {
                if let Some(usage) = &response.usage {
                    debug!(tokens = usage.total_tokens, model = %response.model, "Model replied");
                }
                response.message.content
            }
            Ok(_) => {
                warn!(provider = self.provider.name(), "Model returned an empty reply");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Model call failed");
                FALLBACK_REPLY.to_string()
            }
        };

        // Persistence failures are already logged by the memory log.
        let _ = self
            .memory
            .append(ConversationTurn::new(user_text, reply.clone()))
            .await;

        reply
    }

    /// Run a web search if the text asks for one and a search client is set.
    async fn search_for(&self, user_text: &str) -> Option<String> {
        let search = self.search.as_ref()?;
        if !self.augmenter.should_augment(user_text) {
            return None;
        }

        info!(provider = search.name(), "Searching the web for context");
        match search.search(user_text).await {
            Ok(outcome) => {
                let text = outcome.into_text();
                if text.is_none() {
                    debug!("Search returned no results");
                }
                text
            }
            Err(e) => {
                warn!(provider = search.name(), error = %e, "Web search failed, continuing without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_core::error::{ProviderError, SearchError};
    use jarvis_core::message::{Message, Role};
    use jarvis_core::provider::{ProviderResponse, Usage};
    use jarvis_core::search::SearchOutcome;
    use jarvis_memory::InMemoryStore;
    use std::sync::Mutex;

    /// Replies with a fixed text (or error) and records every request.
    struct MockProvider {
        reply: Result<String, ProviderError>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl MockProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.into()),
                requests: Mutex::new(vec![]),
            })
        }

        fn failing(error: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                requests: Mutex::new(vec![]),
            })
        }

        fn last_messages(&self) -> Vec<Message> {
            self.requests.lock().unwrap().last().unwrap().messages.clone()
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let text = self.reply.clone()?;
            Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    struct StubSearch {
        outcome: Result<SearchOutcome, SearchError>,
        queries: Mutex<Vec<String>>,
    }

    impl StubSearch {
        fn new(outcome: Result<SearchOutcome, SearchError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                queries: Mutex::new(vec![]),
            })
        }

        fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, query: &str) -> Result<SearchOutcome, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.outcome.clone()
        }
    }

    async fn memory(capacity: usize) -> Arc<MemoryLog> {
        Arc::new(MemoryLog::load(Arc::new(InMemoryStore::new()), capacity).await)
    }

    #[tokio::test]
    async fn successful_turn_is_returned_and_logged() {
        let provider = MockProvider::replying("Hello! How can I help?");
        let log = memory(50).await;
        let orchestrator = TurnOrchestrator::new(provider.clone(), "mock-model", "sys", log.clone());

        let reply = orchestrator.process("Hello!").await;
        assert_eq!(reply, "Hello! How can I help?");

        let turns = log.snapshot().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "Hello!");
        assert_eq!(turns[0].assistant_text, "Hello! How can I help?");

        let messages = provider.last_messages();
        assert_eq!(messages, vec![Message::system("sys"), Message::user("Hello!")]);
    }

    #[tokio::test]
    async fn provider_error_yields_fallback() {
        let provider = MockProvider::failing(ProviderError::Timeout("30s".into()));
        let log = memory(50).await;
        let orchestrator = TurnOrchestrator::new(provider.clone(), "m", "sys", log.clone());

        let reply = orchestrator.process("hi").await;
        assert_eq!(reply, FALLBACK_REPLY);
        assert_eq!(log.recent(1).await[0].assistant_text, FALLBACK_REPLY);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn blank_reply_yields_fallback() {
        let log = memory(50).await;
        let orchestrator = TurnOrchestrator::new(MockProvider::replying("  \n"), "m", "sys", log.clone());

        assert_eq!(orchestrator.process("hi").await, FALLBACK_REPLY);
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn history_precedes_current_message() {
        let provider = MockProvider::replying("ok");
        let log = memory(50).await;
        log.append(ConversationTurn::new("first", "one")).await.unwrap();
        log.append(ConversationTurn::new("second", "two")).await.unwrap();
        let orchestrator = TurnOrchestrator::new(provider.clone(), "m", "sys", log.clone());

        orchestrator.process("third").await;

        let contents: Vec<String> = provider
            .last_messages()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["sys", "first", "one", "second", "two", "third"]);
    }

    #[tokio::test]
    async fn history_window_limits_prompt() {
        let provider = MockProvider::replying("ok");
        let log = memory(50).await;
        for i in 0..10 {
            log.append(ConversationTurn::new(format!("u{i}"), format!("a{i}")))
                .await
                .unwrap();
        }
        let orchestrator =
            TurnOrchestrator::new(provider.clone(), "m", "sys", log).with_history_turns(2);

        orchestrator.process("now").await;

        let messages = provider.last_messages();
        assert_eq!(messages.len(), 1 + 2 * 2 + 1);
        assert_eq!(messages[1].content, "u8");
        assert_eq!(messages[4].content, "a9");
    }

    #[tokio::test]
    async fn trigger_with_results_augments_prompt_but_not_log() {
        let provider = MockProvider::replying("Python 3.13 is out.");
        let search = StubSearch::new(Ok(SearchOutcome::Results("Python 3.13 released".into())));
        let log = memory(50).await;
        let orchestrator = TurnOrchestrator::new(provider.clone(), "m", "sys", log.clone())
            .with_search(search.clone());

        let reply = orchestrator.process("search for latest python news").await;
        assert_eq!(reply, "Python 3.13 is out.");
        assert_eq!(search.query_count(), 1);

        let last = provider.last_messages().pop().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content,
            "search for latest python news\n\nWeb search results:\nPython 3.13 released"
        );
        assert_eq!(log.recent(1).await[0].user_text, "search for latest python news");
    }

    #[tokio::test]
    async fn empty_search_sends_plain_text() {
        let provider = MockProvider::replying("Here is what I know.");
        let search = StubSearch::new(Ok(SearchOutcome::Empty));
        let orchestrator = TurnOrchestrator::new(provider.clone(), "m", "sys", memory(50).await)
            .with_search(search);

        let reply = orchestrator.process("search for latest python news").await;
        assert_eq!(reply, "Here is what I know.");
        assert_eq!(
            provider.last_messages().pop().unwrap().content,
            "search for latest python news"
        );
    }

    #[tokio::test]
    async fn search_failure_degrades_silently() {
        let provider = MockProvider::replying("fine");
        let search = StubSearch::new(Err(SearchError::Status(503)));
        let log = memory(50).await;
        let orchestrator =
            TurnOrchestrator::new(provider.clone(), "m", "sys", log.clone()).with_search(search);

        assert_eq!(orchestrator.process("latest news").await, "fine");
        assert_eq!(provider.last_messages().pop().unwrap().content, "latest news");
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn non_trigger_text_skips_search() {
        let provider = MockProvider::replying("hi");
        let search = StubSearch::new(Ok(SearchOutcome::Results("unused".into())));
        let orchestrator = TurnOrchestrator::new(provider.clone(), "m", "sys", memory(50).await)
            .with_search(search.clone());

        orchestrator.process("hello there").await;
        assert_eq!(search.query_count(), 0);
        assert_eq!(provider.last_messages().pop().unwrap().content, "hello there");
    }

    #[tokio::test]
    async fn each_turn_appends_once_and_log_stays_bounded() {
        let log = memory(3).await;
        let orchestrator = TurnOrchestrator::new(MockProvider::replying("r"), "m", "sys", log.clone());

        for i in 0..5 {
            orchestrator.process(&format!("m{i}")).await;
            assert_eq!(log.len().await, (i + 1).min(3));
        }
        let users: Vec<String> = log.snapshot().await.into_iter().map(|t| t.user_text).collect();
        assert_eq!(users, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_turns_never_interleave_log_updates() {
        const TURNS: usize = 40;
        const CAPACITY: usize = 7;

        let store = Arc::new(InMemoryStore::new());
        let log = Arc::new(MemoryLog::load(store.clone(), CAPACITY).await);
        let orchestrator = Arc::new(TurnOrchestrator::new(
            MockProvider::replying("ack"),
            "m",
            "sys",
            log.clone(),
        ));

        let handles: Vec<_> = (0..TURNS)
            .map(|i| {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move { orchestrator.process(&format!("turn {i}")).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "ack");
        }

        assert_eq!(log.len().await, CAPACITY);
        assert_eq!(store.save_count(), TURNS);

        let persisted = store.document().conversations;
        assert_eq!(persisted.len(), CAPACITY);
        assert_eq!(persisted, log.snapshot().await);
        let mut users: Vec<&str> = persisted.iter().map(|t| t.user_text.as_str()).collect();
        users.sort_unstable();
        users.dedup();
        assert_eq!(users.len(), CAPACITY);
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_reply() {
        let store = Arc::new(InMemoryStore::failing());
        let log = Arc::new(MemoryLog::load(store, 10).await);
        let orchestrator = TurnOrchestrator::new(MockProvider::replying("still here"), "m", "sys", log.clone());

        assert_eq!(orchestrator.process("hi").await, "still here");
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn from_config_applies_settings() {
        let mut config = AppConfig::default();
        config.default_temperature = 0.2;
        config.default_max_tokens = 256;
        config.identity.system_prompt_override = Some("Be brief.".into());
        config.search.trigger_terms = vec!["lookup".into()];

        let provider = MockProvider::replying("ok");
        let search = StubSearch::new(Ok(SearchOutcome::Results("data".into())));
        let orchestrator = TurnOrchestrator::from_config(&config, provider.clone(), "m", memory(50).await)
            .with_search(search.clone());

        orchestrator.process("latest news").await;
        assert_eq!(search.query_count(), 0);
        orchestrator.process("lookup rust").await;
        assert_eq!(search.query_count(), 1);

        let request = provider.requests.lock().unwrap()[0].clone();
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.messages[0].content, "Be brief.");
    }
}
