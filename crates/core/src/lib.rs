//! # Jarvis Core
//!
//! Domain types, collaborator traits, and error definitions for the Jarvis
//! assistant. This crate has **no framework dependencies**; it defines the
//! domain model every other crate implements against.
//!
//! Every external collaborator (language model, search, speech, persistence)
//! is a trait here. Implementations live in their respective crates, which
//! keeps the orchestration logic testable with plain stubs.

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod search;
pub mod speech;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::{ConversationTurn, MemoryDocument, TurnStore};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use search::{SearchOutcome, SearchProvider};
pub use speech::SpeechSynthesizer;
