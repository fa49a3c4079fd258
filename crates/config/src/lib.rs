//! Configuration loading, validation, and management for Jarvis.
//!
//! Loads configuration from `~/.jarvis/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.jarvis/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// HTTP timeout for LLM requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Identity configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "google/gemma-3n-e4b-it:free".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_request_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("memory", &self.memory)
            .field("search", &self.search)
            .field("voice", &self.voice)
            .field("gateway", &self.gateway)
            .field("identity", &self.identity)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Memory file; defaults to `~/.jarvis/memory.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Maximum number of turns kept in the log
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// How many recent turns are sent to the model as history
    #[serde(default = "default_max_turns")]
    pub history_turns: usize,
}

fn default_max_turns() -> usize {
    50
}

impl MemoryConfig {
    /// The memory file to use, falling back to the default location.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("memory.json"))
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_turns: default_max_turns(),
            history_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_search_url")]
    pub base_url: String,

    #[serde(default = "default_search_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Fall back to a search-page link when no instant answer exists
    #[serde(default = "default_true")]
    pub link_fallback: bool,

    /// Case-insensitive substrings that trigger prompt augmentation
    #[serde(default = "default_trigger_terms")]
    pub trigger_terms: Vec<String>,
}

fn default_search_url() -> String {
    "https://api.duckduckgo.com/".into()
}
fn default_search_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    10
}
fn default_trigger_terms() -> Vec<String> {
    ["search", "latest", "current", "news", "what's happening"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_search_url(),
            max_results: default_search_results(),
            timeout_secs: default_search_timeout(),
            link_fallback: true,
            trigger_terms: default_trigger_terms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_voice_url")]
    pub base_url: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_speed")]
    pub speed: f32,

    #[serde(default = "default_voice_timeout")]
    pub timeout_secs: u64,

    /// Player commands tried in order; the audio file path is appended
    #[serde(default = "default_players")]
    pub players: Vec<Vec<String>>,

    /// Where audio is saved when no player succeeds
    #[serde(default = "default_fallback_path")]
    pub fallback_path: PathBuf,
}

fn default_voice_url() -> String {
    "https://api.puter.ai/v1/ai/txt2speech".into()
}
fn default_voice() -> String {
    "en-US-Standard-A".into()
}
fn default_speed() -> f32 {
    1.0
}
fn default_voice_timeout() -> u64 {
    30
}
fn default_players() -> Vec<Vec<String>> {
    let player = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
    vec![
        player(&["mpg123", "-q"]),
        player(&["afplay"]),
        player(&["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]),
        player(&["vlc", "--intf", "dummy", "--play-and-exit"]),
    ]
}
fn default_fallback_path() -> PathBuf {
    PathBuf::from("jarvis_speech.mp3")
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_voice_url(),
            voice: default_voice(),
            speed: default_speed(),
            timeout_secs: default_voice_timeout(),
            players: default_players(),
            fallback_path: default_fallback_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS. Empty = same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Display name used by the CLI
    #[serde(default = "default_identity_name")]
    pub name: String,

    /// Override the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_identity_name() -> String {
    "Jarvis".into()
}

/// The built-in system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Jarvis, a highly capable AI assistant with deep reasoning, \
project planning, code generation, and multilingual communication skills. You speak and write \
fluently in Bengali, English, and Hindi, and switch naturally when required.

Your core capabilities include:
1. Understanding high-level project goals and breaking them down into actionable steps
2. Generating well-structured outputs (Markdown, JSON, code snippets, tables, etc.)
3. Providing thorough explanations with bullet points and numbered lists
4. Maintaining clarity, consistency, and accuracy in all responses
5. Respecting constraints on timeline, budget, and technology stack
6. Suggesting optimizations, trade-offs, and risk mitigations

You have access to web search results for real-time information and can provide voice \
responses when requested. Always be helpful and accurate, and keep context throughout \
the conversation.";

impl IdentityConfig {
    /// The system prompt to send with every turn.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt_override
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_identity_name(),
            system_prompt_override: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.jarvis/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `JARVIS_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `JARVIS_PROVIDER`, `JARVIS_MODEL`, `JARVIS_MEMORY_FILE`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("JARVIS_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("JARVIS_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("JARVIS_MODEL") {
            config.default_model = model;
        }

        if let Ok(memory_file) = std::env::var("JARVIS_MEMORY_FILE") {
            config.memory.path = Some(PathBuf::from(memory_file));
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".jarvis")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_turns must be at least 1".into(),
            ));
        }

        if !(0.5..=2.0).contains(&self.voice.speed) {
            return Err(ConfigError::ValidationError(
                "voice.speed must be between 0.5 and 2.0".into(),
            ));
        }

        if self.search.enabled && self.search.trigger_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "search.trigger_terms must not be empty when search is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            memory: MemoryConfig::default(),
            search: SearchConfig::default(),
            voice: VoiceConfig::default(),
            gateway: GatewayConfig::default(),
            identity: IdentityConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
