//! Conversation memory for Jarvis: the capped log and its stores.

pub mod file_backend;
pub mod in_memory;
pub mod log;

pub use file_backend::JsonFileStore;
pub use in_memory::InMemoryStore;
pub use log::{DEFAULT_CAPACITY, MemoryLog};
