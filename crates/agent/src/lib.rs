//! The turn pipeline at the heart of Jarvis.
//!
//! For each user message the orchestrator:
//!
//! 1. **Searches** the web when the text carries a trigger term
//! 2. **Augments** the message with whatever the search found
//! 3. **Builds** the prompt: system prompt, recent history, current message
//! 4. **Calls** the language model once
//! 5. **Records** the exchange (or the fallback reply) in the memory log

pub mod augmenter;
pub mod builder;
pub mod orchestrator;
pub mod prompt;

pub use augmenter::{DEFAULT_TRIGGER_TERMS, SearchAugmenter};
pub use builder::{build_orchestrator, load_memory};
pub use orchestrator::{FALLBACK_REPLY, TurnOrchestrator};
pub use prompt::PromptBuilder;
