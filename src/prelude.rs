//! Convenience re-exports for common use.

pub use crate::audio::{AssetStore, AudioPlayer, DurationProbe, SimulatedPlayer, SymphoniaProbe};
pub use crate::config::MonologueConfig;
pub use crate::error::{MonologueError, Result};
pub use crate::generation::{OpenAiChatClient, SegmentPhase, TextGenerator};
pub use crate::pipeline::{
    Coordinator, PipelineEvent, PipelineEventPayload, PipelineHandle, PipelineOptions,
    PipelineOutcome, PipelineSnapshot, PipelineStatus, PlaybackStart, StageStatus,
};
pub use crate::speech::{
    AudioFormat, OpenAiSpeechProvider, SpeechProvider, SpeechSynthesisClient, SpeechSynthesizer,
};
pub use crate::types::{AudioAsset, Conversation, HistoryEntry, PodcastRequest, Role, Segment, Voice};
