//! OpenAI speech provider (`/audio/speech`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::types::{AudioFormat, SpeechRequest};
use super::SpeechProvider;
use crate::config::{MonologueConfig, DEFAULT_BASE_URL, DEFAULT_SPEECH_MODEL};
use crate::error::{MonologueError, Result};
use crate::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// OpenAI TTS provider.
#[derive(Debug, Clone)]
pub struct OpenAiSpeechProvider {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
    retry_policy: RetryPolicy,
}

impl OpenAiSpeechProvider {
    pub fn new(api_key: String) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn new_with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: DEFAULT_SPEECH_MODEL.to_string(),
            timeout: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &MonologueConfig) -> Result<Self> {
        Ok(
            Self::new_with_base_url(config.require_api_key()?.to_string(), &config.base_url)
                .with_model(&config.speech_model)
                .with_timeout(config.request_timeout)
                .with_retry_policy(RetryPolicy::with_max_attempts(config.max_attempts)),
        )
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn validate_request(&self, request: &SpeechRequest) -> Result<()> {
        if request.text.trim().is_empty() {
            return Err(MonologueError::InvalidArgument(
                "Speech text cannot be empty".to_string(),
            ));
        }
        if let Some(speed) = request.speed {
            if !speed.is_finite() || !(0.25..=4.0).contains(&speed) {
                return Err(MonologueError::InvalidArgument(
                    "Speech speed must be between 0.25 and 4.0".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn generate_speech_once(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let mut payload = serde_json::json!({
            "model": self.model,
            "input": request.text,
            "voice": request.voice.id(),
            "response_format": request.format.wire_name(),
        });
        if let Some(speed) = request.speed {
            payload["speed"] = serde_json::json!(speed);
        }

        let url = format!("{}/audio/speech", trim_trailing_slash(&self.base_url));
        debug!(model = %self.model, voice = %request.voice, chars = request.text.len(), "speech request");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(&url)
                .headers(bearer_headers(&self.api_key))
                .json(&payload)
                .send()
                .await?;

            parse_speech_response(response, request.format).await
        })
        .await
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        self.validate_request(request)?;
        self.retry_policy
            .execute(|| self.generate_speech_once(request))
            .await
    }
}

async fn parse_speech_response(response: reqwest::Response, format: AudioFormat) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_to_error(status.as_u16(), &body));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        return Err(MonologueError::Decode(
            "Expected audio payload, got JSON response".to_string(),
        ));
    }
    if !content_type.is_empty() && !format.matches_content_type(&content_type) {
        return Err(MonologueError::Decode(format!(
            "Unexpected speech response type '{content_type}' for format {format}"
        )));
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(MonologueError::Decode(
            "Speech response contained empty audio payload".to_string(),
        ));
    }

    Ok(bytes.to_vec())
}
