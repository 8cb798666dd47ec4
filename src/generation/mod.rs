//! Text generation: the chat-completion client and the segment prompts.

pub mod openai;
pub mod prompt;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::HistoryEntry;

pub use openai::OpenAiChatClient;
pub use prompt::{build_prompt, PhasePlan, SegmentPhase, COMPLETION_THRESHOLD};

/// A stateless text generator.
///
/// Every call receives the latest copy of the conversation history; the
/// caller appends the new user/assistant pair once the segment is accepted.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, history: &[HistoryEntry]) -> Result<String>;
}
