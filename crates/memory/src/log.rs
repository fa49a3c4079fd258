//! The capped conversation log.
//!
//! `MemoryLog` owns the only copy of the conversation history. It loads once
//! from a [`TurnStore`], keeps at most `capacity` turns (oldest evicted
//! first), and writes the whole document back after every mutation.
//!
//! All reads and writes go through a single async mutex, held across the
//! persist call, so concurrent turns never interleave their updates.

use std::sync::Arc;
use jarvis_core::error::MemoryError;
use jarvis_core::memory::{ConversationTurn, MemoryDocument, TurnStore};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Default number of turns kept.
pub const DEFAULT_CAPACITY: usize = 50;

pub struct MemoryLog {
    store: Arc<dyn TurnStore>,
    capacity: usize,
    document: Mutex<MemoryDocument>,
}

impl MemoryLog {
    /// Load the log from `store`.
    ///
    /// Never fails: an unreadable or corrupt store is logged and the log
    /// starts empty. A stored log longer than `capacity` keeps its newest
    /// turns. A `capacity` of zero is treated as one.
    pub async fn load(store: Arc<dyn TurnStore>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut document = match store.load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(store = store.name(), error = %e, "Failed to load memory, starting empty");
                MemoryDocument::default()
            }
        };

        let excess = document.conversations.len().saturating_sub(capacity);
        if excess > 0 {
            document.conversations.drain(..excess);
            info!(dropped = excess, capacity, "Trimmed stored conversation log");
        }

        debug!(
            store = store.name(),
            turns = document.conversations.len(),
            capacity,
            "Memory log ready"
        );

        Self {
            store,
            capacity,
            document: Mutex::new(document),
        }
    }

    /// Maximum number of turns retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a turn, evicting the oldest entries beyond capacity, then persist.
    ///
    /// The in-memory log is updated even when persisting fails; the error is
    /// logged and returned so the caller may surface it, but the turn is not
    /// lost for the rest of the process lifetime.
    pub async fn append(&self, turn: ConversationTurn) -> Result<(), MemoryError> {
        let mut document = self.document.lock().await;
        document.conversations.push(turn);

        let excess = document.conversations.len().saturating_sub(self.capacity);
        if excess > 0 {
            document.conversations.drain(..excess);
        }

        self.persist(&document).await
    }

    /// Up to the last `k` turns, oldest first.
    pub async fn recent(&self, k: usize) -> Vec<ConversationTurn> {
        let document = self.document.lock().await;
        let start = document.conversations.len().saturating_sub(k);
        document.conversations[start..].to_vec()
    }

    /// Every retained turn, oldest first.
    pub async fn snapshot(&self) -> Vec<ConversationTurn> {
        self.document.lock().await.conversations.clone()
    }

    pub async fn len(&self) -> usize {
        self.document.lock().await.conversations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop all turns (preferences are kept) and persist.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        let mut document = self.document.lock().await;
        document.conversations.clear();
        self.persist(&document).await
    }

    /// Store a user preference and persist.
    pub async fn set_preference(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), MemoryError> {
        let mut document = self.document.lock().await;
        document.user_preferences.insert(key.into(), value);
        self.persist(&document).await
    }

    pub async fn preference(&self, key: &str) -> Option<serde_json::Value> {
        self.document.lock().await.user_preferences.get(key).cloned()
    }

    async fn persist(&self, document: &MemoryDocument) -> Result<(), MemoryError> {
        self.store.save(document).await.map_err(|e| {
            error!(store = self.store.name(), error = %e, "Failed to save memory");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryStore;

    fn pairs(turns: &[ConversationTurn]) -> Vec<(&str, &str)> {
        turns
            .iter()
            .map(|t| (t.user_text.as_str(), t.assistant_text.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn keeps_most_recent_turns_in_order() {
        let log = MemoryLog::load(Arc::new(InMemoryStore::new()), 2).await;
        log.append(ConversationTurn::new("hi", "hello")).await.unwrap();
        log.append(ConversationTurn::new("bye", "goodbye")).await.unwrap();
        log.append(ConversationTurn::new("ok", "sure")).await.unwrap();

        let recent = log.recent(10).await;
        assert_eq!(pairs(&recent), vec![("bye", "goodbye"), ("ok", "sure")]);
    }

    #[tokio::test]
    async fn length_never_exceeds_capacity() {
        let log = MemoryLog::load(Arc::new(InMemoryStore::new()), 5).await;
        for i in 0..12 {
            log.append(ConversationTurn::new(format!("m{i}"), format!("r{i}")))
                .await
                .unwrap();
            assert!(log.len().await <= 5);
        }

        let all = log.snapshot().await;
        let users: Vec<_> = all.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["m7", "m8", "m9", "m10", "m11"]);
    }

    #[tokio::test]
    async fn recent_handles_small_and_zero_k() {
        let log = MemoryLog::load(Arc::new(InMemoryStore::new()), DEFAULT_CAPACITY).await;
        assert!(log.recent(3).await.is_empty());

        for i in 0..15 {
            log.append(ConversationTurn::new(format!("Message {i}"), format!("Response {i}")))
                .await
                .unwrap();
        }

        let recent = log.recent(5).await;
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].user_text, "Message 10");
        assert_eq!(recent[4].user_text, "Message 14");
        assert!(log.recent(0).await.is_empty());
    }

    #[tokio::test]
    async fn every_append_is_persisted() {
        let store = Arc::new(InMemoryStore::new());
        let log = MemoryLog::load(store.clone(), 3).await;
        log.append(ConversationTurn::new("a", "1")).await.unwrap();
        log.append(ConversationTurn::new("b", "2")).await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.document().conversations.len(), 2);
    }

    #[tokio::test]
    async fn save_failure_keeps_in_memory_log() {
        let store = Arc::new(InMemoryStore::failing());
        let log = MemoryLog::load(store.clone(), 3).await;

        let result = log.append(ConversationTurn::new("hello", "hi")).await;
        assert!(result.is_err());
        assert_eq!(log.len().await, 1);
        assert_eq!(log.recent(1).await[0].user_text, "hello");

        // Store recovers: the next save carries both turns.
        store.set_failing(false);
        log.append(ConversationTurn::new("again", "yes")).await.unwrap();
        assert_eq!(store.document().conversations.len(), 2);
    }

    #[tokio::test]
    async fn oversized_store_is_trimmed_on_load() {
        let mut doc = MemoryDocument::default();
        for i in 0..10 {
            doc.conversations
                .push(ConversationTurn::new(format!("u{i}"), format!("a{i}")));
        }
        let log = MemoryLog::load(Arc::new(InMemoryStore::with_document(doc)), 4).await;

        assert_eq!(log.len().await, 4);
        assert_eq!(log.recent(1).await[0].user_text, "u9");
        assert_eq!(log.snapshot().await[0].user_text, "u6");
    }

    #[tokio::test]
    async fn corrupt_store_starts_empty_without_losing_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = Arc::new(crate::JsonFileStore::new(&path));

        let log = MemoryLog::load(store.clone(), DEFAULT_CAPACITY).await;
        assert!(log.is_empty().await);

        log.append(ConversationTurn::new("hi", "hello")).await.unwrap();
        assert_eq!(std::fs::read(store.corrupt_path()).unwrap(), b"{ not json");
    }

    #[tokio::test]
    async fn legacy_file_history_survives_next_append() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{"conversations":[{"timestamp":"2024-05-01T12:34:56.789012","user":"hi","assistant":"hello"}],"user_preferences":{"language":"en"}}"#,
        )
        .unwrap();
        let store = Arc::new(crate::JsonFileStore::new(&path));

        let log = MemoryLog::load(store.clone(), DEFAULT_CAPACITY).await;
        assert_eq!(pairs(&log.snapshot().await), vec![("hi", "hello")]);

        log.append(ConversationTurn::new("still there?", "yes")).await.unwrap();

        let on_disk = store.load().await.unwrap();
        assert_eq!(
            pairs(&on_disk.conversations),
            vec![("hi", "hello"), ("still there?", "yes")]
        );
        assert_eq!(on_disk.user_preferences["language"], "en");
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let log = MemoryLog::load(Arc::new(InMemoryStore::new()), 0).await;
        assert_eq!(log.capacity(), 1);
        log.append(ConversationTurn::new("a", "b")).await.unwrap();
        log.append(ConversationTurn::new("c", "d")).await.unwrap();
        assert_eq!(pairs(&log.snapshot().await), vec![("c", "d")]);
    }

    #[tokio::test]
    async fn preferences_and_clear() {
        let store = Arc::new(InMemoryStore::new());
        let log = MemoryLog::load(store.clone(), 3).await;

        log.set_preference("language", serde_json::json!("en")).await.unwrap();
        log.set_preference("voice_enabled", serde_json::json!(true)).await.unwrap();
        log.append(ConversationTurn::new("a", "b")).await.unwrap();

        assert_eq!(log.preference("language").await, Some(serde_json::json!("en")));
        assert_eq!(log.preference("nonexistent").await, None);

        log.clear().await.unwrap();
        assert!(log.is_empty().await);
        assert_eq!(log.preference("voice_enabled").await, Some(serde_json::json!(true)));
        assert!(store.document().conversations.is_empty());
    }
}
