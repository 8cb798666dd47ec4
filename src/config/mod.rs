//! Configuration loaded from the process environment (and `.env`).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MonologueError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1-hd";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant";
pub const DEFAULT_MAX_SEGMENTS: usize = 64;
/// Shortest clip a healthy segment is expected to produce. Long targets
/// raise the segment cap to `target / MIN_SEGMENT_DURATION`.
pub const MIN_SEGMENT_DURATION: Duration = Duration::from_secs(10);

/// Environment variables read by [`MonologueConfig::from_env`].
pub const CONFIG_ENV_VARS: [&str; 11] = [
    "OPENAI_API_KEY",
    "HIDDEN_GPTAPIKEY",
    "OPENAI_BASE_URL",
    "MONOLOGUE_CHAT_MODEL",
    "MONOLOGUE_SPEECH_MODEL",
    "MONOLOGUE_MAX_TOKENS",
    "MONOLOGUE_SYSTEM_PROMPT",
    "MONOLOGUE_OUTPUT_DIR",
    "MONOLOGUE_REQUEST_TIMEOUT_SECS",
    "MONOLOGUE_MAX_ATTEMPTS",
    "MONOLOGUE_MAX_SEGMENTS",
];

/// Runtime configuration for the clients and the pipeline.
#[derive(Clone)]
pub struct MonologueConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub speech_model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Root under which each conversation gets its own asset directory.
    pub output_dir: PathBuf,
    /// `None` leaves request timing to the transport.
    pub request_timeout: Option<Duration>,
    pub max_attempts: u32,
    pub max_segments: usize,
}

impl fmt::Debug for MonologueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonologueConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("speech_model", &self.speech_model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .field("output_dir", &self.output_dir)
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("max_segments", &self.max_segments)
            .finish()
    }
}

impl Default for MonologueConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            output_dir: default_output_dir(),
            request_timeout: None,
            max_attempts: 1,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

impl MonologueConfig {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = get("OPENAI_API_KEY").or_else(|| get("HIDDEN_GPTAPIKEY"));
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = get("MONOLOGUE_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Some(model) = get("MONOLOGUE_SPEECH_MODEL") {
            config.speech_model = model;
        }
        if let Some(prompt) = get("MONOLOGUE_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        if let Some(dir) = get("MONOLOGUE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("MONOLOGUE_MAX_TOKENS") {
            config.max_tokens = parse_positive("MONOLOGUE_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = get("MONOLOGUE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_positive("MONOLOGUE_REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(raw) = get("MONOLOGUE_MAX_ATTEMPTS") {
            config.max_attempts = parse_positive("MONOLOGUE_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = get("MONOLOGUE_MAX_SEGMENTS") {
            config.max_segments = parse_positive("MONOLOGUE_MAX_SEGMENTS", &raw)?;
        }

        Ok(config)
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| {
                MonologueError::Configuration(
                    "OPENAI_API_KEY is not set; export it or add it to .env".to_string(),
                )
            })
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(MonologueError::Configuration(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

/// Per-user cache directory for conversation assets.
pub fn default_output_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "monologue")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("monologue"))
}
