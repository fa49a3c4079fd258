//! External services Jarvis talks to besides the language model.
//!
//! - `web_search`: DuckDuckGo Instant Answer client used for prompt augmentation
//! - `tts`: puter.ai text-to-speech client
//! - `playback`: command-line audio players with a save-to-file fallback
//! - `voice`: synthesis + playback behind one handle

pub mod playback;
pub mod tts;
pub mod voice;
pub mod web_search;

pub use playback::{AudioPlayer, PlaybackOutcome};
pub use tts::{AVAILABLE_VOICES, PuterTts};
pub use voice::Voice;
pub use web_search::DuckDuckGoSearch;
