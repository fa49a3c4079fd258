pub mod ask;
pub mod chat;
pub mod memory;
pub mod onboard;
pub mod search;
pub mod serve;
pub mod voices;

use std::path::Path;
use jarvis_config::AppConfig;
use jarvis_core::error::SpeechError;
use jarvis_tools::{PlaybackOutcome, Voice};

/// Load config from `path` if given, else from `~/.jarvis/config.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            AppConfig::load_with_env(path)
        }
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Point the user at key setup when the provider will need one.
pub fn warn_if_no_api_key(config: &AppConfig) {
    if config.has_api_key() || config.default_provider == "ollama" {
        return;
    }
    eprintln!();
    eprintln!("  WARNING: No API key configured; replies will fall back to an apology.");
    eprintln!("  Set JARVIS_API_KEY or OPENROUTER_API_KEY, or add `api_key` to:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!("  Get an OpenRouter key at: https://openrouter.ai/keys");
    eprintln!();
}

/// Speak `reply` if voice output is available, reporting the outcome.
pub async fn speak_reply(voice: Option<&Voice>, reply: &str) {
    let Some(voice) = voice else {
        eprintln!("  [Voice output is disabled]");
        return;
    };

    match voice.speak(reply).await {
        Ok(PlaybackOutcome::Played { .. }) => {}
        Ok(PlaybackOutcome::Saved(path)) => {
            eprintln!("  [No audio player found; speech saved to {}]", path.display());
        }
        Err(e) => eprintln!("  [Speech failed] {e}"),
    }
}

/// Synthesize `reply` into an audio file at `path`.
pub async fn save_reply(voice: Option<&Voice>, reply: &str, path: &Path) -> Result<(), SpeechError> {
    let voice = voice.ok_or(SpeechError::Disabled)?;
    voice.save(reply, path).await?;
    tracing::info!(path = %path.display(), "Speech saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_core::speech::SpeechSynthesizer;
    use jarvis_tools::AudioPlayer;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct EchoSynth;

    #[async_trait]
    impl SpeechSynthesizer for EchoSynth {
        fn name(&self) -> &str {
            "echo"
        }

        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    fn voice(dir: &TempDir) -> Voice {
        Voice::new(
            Arc::new(EchoSynth),
            AudioPlayer::new(vec![], Duration::from_secs(1), dir.path().join("fallback.mp3")),
        )
    }

    #[tokio::test]
    async fn save_reply_writes_audio_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("reply.mp3");
        save_reply(Some(&voice(&dir)), "good evening", &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"good evening");
    }

    #[tokio::test]
    async fn save_reply_without_voice_is_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reply.mp3");
        let err = save_reply(None, "hi", &path).await.unwrap_err();
        assert!(matches!(err, SpeechError::Disabled));
        assert!(!path.exists());
    }
}
