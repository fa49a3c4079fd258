//! In-memory store, useful for testing and ephemeral sessions.

use async_trait::async_trait;
use jarvis_core::error::MemoryError;
use jarvis_core::memory::{MemoryDocument, TurnStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps the last saved document in a `Mutex`.
///
/// `failing()` builds a store whose saves always error, for exercising the
/// non-fatal persistence path.
pub struct InMemoryStore {
    document: Mutex<MemoryDocument>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_document(MemoryDocument::default())
    }

    /// Start from a pre-populated document.
    pub fn with_document(document: MemoryDocument) -> Self {
        Self {
            document: Mutex::new(document),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// A store that rejects every save.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved document.
    pub fn document(&self) -> MemoryDocument {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<MemoryDocument, MemoryError> {
        Ok(self.document())
    }

    async fn save(&self, document: &MemoryDocument) -> Result<(), MemoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(MemoryError::Storage("store is read-only".into()));
        }
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
