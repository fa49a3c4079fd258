//! Conversation memory: turns, the persisted document and the store trait.
//!
//! A [`ConversationTurn`] is one user message plus the reply the user saw.
//! The whole log is persisted as a single [`MemoryDocument`] through a
//! [`TurnStore`]; there is exactly one log per process.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::MemoryError;

/// One user message and the assistant reply that answered it.
///
/// Field names on disk (`user`, `assistant`) match the `memory.json`
/// layout written by earlier versions of the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// When the turn completed
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// What the user typed (never the search-augmented text)
    #[serde(rename = "user")]
    pub user_text: String,

    /// What the user was shown, including the fallback reply
    #[serde(rename = "assistant")]
    pub assistant_text: String,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
        }
    }
}

/// Accept RFC 3339 timestamps and offset-less ISO 8601 ones
/// (`2024-05-01T12:34:56.789012`), the latter read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// The persisted unit: the capped log plus user preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Conversation turns, oldest first
    #[serde(default)]
    pub conversations: Vec<ConversationTurn>,

    /// Free-form user preferences (language, voice, ...)
    #[serde(default)]
    pub user_preferences: serde_json::Map<String, serde_json::Value>,
}

/// Where the memory document lives between process runs.
///
/// Implementations: JSON file, in-memory (for testing).
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// The store name (e.g., "json_file", "in_memory").
    fn name(&self) -> &str;

    /// Load the document. A store that does not exist yet yields an empty
    /// document; unreadable or unparsable contents are an error.
    async fn load(&self) -> std::result::Result<MemoryDocument, MemoryError>;

    /// Replace the stored document.
    async fn save(&self, document: &MemoryDocument) -> std::result::Result<(), MemoryError>;
}
