//! Speech trait: turns reply text into audio bytes.

use async_trait::async_trait;
use crate::error::SpeechError;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// The backend name (e.g., "puter").
    fn name(&self) -> &str;

    /// Synthesize `text` and return encoded audio (MP3).
    async fn synthesize(&self, text: &str) -> std::result::Result<Vec<u8>, SpeechError>;
}
