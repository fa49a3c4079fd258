//! Text-to-speech via the puter.ai `txt2speech` endpoint.
//!
//! The endpoint either streams audio back directly or answers with JSON. A
//! JSON body carrying `audio_url` points at the finished file; any other
//! JSON body is an error report.

use async_trait::async_trait;
use jarvis_config::VoiceConfig;
use jarvis_core::error::SpeechError;
use jarvis_core::speech::SpeechSynthesizer;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Voices the service is known to accept.
pub const AVAILABLE_VOICES: &[(&str, &str)] = &[
    ("en-US-Standard-A", "US English, female"),
    ("en-US-Standard-B", "US English, male"),
    ("en-US-Standard-C", "US English, female"),
    ("en-US-Standard-D", "US English, male"),
    ("en-GB-Standard-A", "British English, female"),
    ("en-GB-Standard-B", "British English, male"),
];

const MIN_SPEED: f32 = 0.5;
const MAX_SPEED: f32 = 2.0;

pub struct PuterTts {
    client: reqwest::Client,
    base_url: String,
    voice: String,
    speed: f32,
}

#[derive(Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f32,
    format: &'a str,
}

/// How the service answered a synthesis request.
#[derive(Debug, PartialEq)]
enum TtsReply {
    Audio(Vec<u8>),
    AudioUrl(String),
    Error(String),
}

impl PuterTts {
    pub fn new(
        base_url: impl Into<String>,
        voice: impl Into<String>,
        speed: f32,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Jarvis/", env!("CARGO_PKG_VERSION"), " (AI Assistant)"))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
            voice: voice.into(),
            speed: speed.clamp(MIN_SPEED, MAX_SPEED),
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.voice,
            config.speed,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Api {
                status_code: status.as_u16(),
                message: format!("audio download from {url} failed"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for PuterTts {
    fn name(&self) -> &str {
        "puter"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            text,
            voice: &self.voice,
            speed: self.speed,
            format: "mp3",
        };

        debug!(voice = %self.voice, chars = text.len(), "Requesting speech synthesis");

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        match classify_reply(&content_type, &body) {
            TtsReply::Audio(audio) => Ok(audio),
            TtsReply::AudioUrl(url) => self.download(&url).await,
            TtsReply::Error(message) => Err(SpeechError::Api {
                status_code: status.as_u16(),
                message,
            }),
        }
    }
}

fn classify_reply(content_type: &str, body: &[u8]) -> TtsReply {
    if !content_type.contains("application/json") {
        return TtsReply::Audio(body.to_vec());
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(json) => match json.get("audio_url").and_then(|u| u.as_str()) {
            Some(url) => TtsReply::AudioUrl(url.to_string()),
            None => TtsReply::Error(json.to_string()),
        },
        Err(_) => TtsReply::Error("invalid JSON response from TTS API".into()),
    }
}
