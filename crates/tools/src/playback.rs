//! Audio playback through whatever command-line player is installed.
//!
//! Each configured player is tried in order against a temp MP3 file. When
//! none of them exits successfully the audio is saved to a fallback path so
//! the user can still play it by hand.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use jarvis_config::VoiceConfig;
use jarvis_core::error::SpeechError;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// What happened to a piece of audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// A player ran to completion
    Played { player: String },
    /// No player worked; audio was written here instead
    Saved(PathBuf),
}

pub struct AudioPlayer {
    players: Vec<Vec<String>>,
    timeout: Duration,
    fallback_path: PathBuf,
}

impl AudioPlayer {
    pub fn new(players: Vec<Vec<String>>, timeout: Duration, fallback_path: impl Into<PathBuf>) -> Self {
        Self {
            players: players.into_iter().filter(|p| !p.is_empty()).collect(),
            timeout,
            fallback_path: fallback_path.into(),
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(
            config.players.clone(),
            Duration::from_secs(config.timeout_secs),
            &config.fallback_path,
        )
    }

    /// Play MP3 bytes, or save them to the fallback path if no player works.
    pub async fn play(&self, audio: &[u8]) -> Result<PlaybackOutcome, SpeechError> {
        let temp = std::env::temp_dir().join(format!("jarvis-{}.mp3", uuid::Uuid::new_v4()));
        tokio::fs::write(&temp, audio).await?;

        let mut played_by = None;
        for player in &self.players {
            if self.try_player(player, &temp).await {
                played_by = Some(player[0].clone());
                break;
            }
        }

        if let Err(e) = tokio::fs::remove_file(&temp).await {
            debug!(path = %temp.display(), error = %e, "Could not remove temp audio file");
        }

        match played_by {
            Some(player) => Ok(PlaybackOutcome::Played { player }),
            None => {
                warn!("No suitable audio player found; saving audio instead");
                save_audio(&self.fallback_path, audio).await?;
                info!(path = %self.fallback_path.display(), "Audio saved");
                Ok(PlaybackOutcome::Saved(self.fallback_path.clone()))
            }
        }
    }

    async fn try_player(&self, player: &[String], file: &Path) -> bool {
        let mut command = Command::new(&player[0]);
        command
            .args(&player[1..])
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.status()).await {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                debug!(player = %player[0], code = ?status.code(), "Player exited with failure");
                false
            }
            Ok(Err(e)) => {
                debug!(player = %player[0], error = %e, "Player unavailable");
                false
            }
            Err(_) => {
                debug!(player = %player[0], "Player timed out");
                false
            }
        }
    }
}

/// Write audio to `path`, creating parent directories as needed.
pub async fn save_audio(path: &Path, audio: &[u8]) -> Result<(), SpeechError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, audio).await?;
    Ok(())
}
