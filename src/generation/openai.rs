//! OpenAI Chat Completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TextGenerator;
use crate::config::{
    MonologueConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_MAX_TOKENS,
    DEFAULT_SYSTEM_PROMPT,
};
use crate::error::{MonologueError, Result};
use crate::http::{bearer_headers, shared_client, status_to_error, trim_trailing_slash};
use crate::types::{HistoryEntry, Role};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// Chat-completion client (`/chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    system_prompt: String,
    timeout: Option<Duration>,
    retry_policy: RetryPolicy,
}

impl OpenAiChatClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn new_with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &MonologueConfig) -> Result<Self> {
        Ok(
            Self::new_with_base_url(config.require_api_key()?.to_string(), &config.base_url)
                .with_model(&config.chat_model)
                .with_max_tokens(config.max_tokens)
                .with_system_prompt(&config.system_prompt)
                .with_timeout(config.request_timeout)
                .with_retry_policy(RetryPolicy::with_max_attempts(config.max_attempts)),
        )
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
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

    fn build_request<'a>(&'a self, prompt: &'a str, history: &'a [HistoryEntry]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage {
            role: Role::System,
            content: &self.system_prompt,
        });
        messages.extend(history.iter().map(|entry| WireMessage {
            role: entry.role,
            content: &entry.content,
        }));
        messages.push(WireMessage {
            role: Role::User,
            content: prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        }
    }

    async fn generate_once(&self, prompt: &str, history: &[HistoryEntry]) -> Result<String> {
        let body = self.build_request(prompt, history);
        let url = format!("{}/chat/completions", trim_trailing_slash(&self.base_url));

        debug!(model = %self.model, history = history.len(), "chat completion request");

        with_timeout(self.timeout, async {
            let response = shared_client()
                .post(&url)
                .headers(bearer_headers(&self.api_key))
                .json(&body)
                .send()
                .await?;

            parse_chat_response(response).await
        })
        .await
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn generate(&self, prompt: &str, history: &[HistoryEntry]) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(MonologueError::InvalidArgument(
                "Prompt cannot be empty".to_string(),
            ));
        }
        self.retry_policy
            .execute(|| self.generate_once(prompt, history))
            .await
    }
}

async fn parse_chat_response(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_to_error(status.as_u16(), &body));
    }

    let body = response.text().await?;
    let parsed: ChatResponse = serde_json::from_str(&body)?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| MonologueError::Decode("No choices in chat completion".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(MonologueError::Decode(
            "Chat completion returned empty content".to_string(),
        ));
    }
    Ok(content)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
