//! Voice output: synthesis plus playback.

use std::path::Path;
use std::sync::Arc;
use jarvis_config::VoiceConfig;
use jarvis_core::error::SpeechError;
use jarvis_core::speech::SpeechSynthesizer;

use crate::playback::{AudioPlayer, PlaybackOutcome, save_audio};
use crate::tts::PuterTts;

pub struct Voice {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: AudioPlayer,
}

impl Voice {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: AudioPlayer) -> Self {
        Self { synthesizer, player }
    }

    /// Build from config; `None` when voice output is disabled.
    pub fn from_config(config: &VoiceConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(
                Arc::new(PuterTts::from_config(config)),
                AudioPlayer::from_config(config),
            )
        })
    }

    /// Synthesize `text` and play it.
    pub async fn speak(&self, text: &str) -> Result<PlaybackOutcome, SpeechError> {
        let audio = self.synthesizer.synthesize(text).await?;
        self.player.play(&audio).await
    }

    /// Synthesize `text` and write the audio to `path`.
    pub async fn save(&self, text: &str, path: &Path) -> Result<(), SpeechError> {
        let audio = self.synthesizer.synthesize(text).await?;
        save_audio(path, &audio).await
    }
}
