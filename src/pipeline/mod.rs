//! The segmented generation, synthesis and playback pipeline.
//!
//! A [`Coordinator`] starts one producer loop (generate text, synthesize,
//! commit) and one playback loop per run. The two share a
//! [`PipelineState`] and synchronize only through its monotonically
//! increasing download cursor.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use monologue::prelude::*;
//!
//! # async fn example() -> monologue::error::Result<()> {
//! let config = MonologueConfig::from_env()?;
//! let generator = Arc::new(OpenAiChatClient::from_config(&config)?);
//! let provider = Arc::new(OpenAiSpeechProvider::from_config(&config)?);
//! let synthesizer = Arc::new(SpeechSynthesisClient::new(provider, Arc::new(SymphoniaProbe)));
//!
//! let coordinator = Coordinator::new(
//!     generator,
//!     synthesizer,
//!     Arc::new(SimulatedPlayer::new()),
//!     PipelineOptions::from_config(&config),
//! );
//! let request = PodcastRequest::builder()
//!     .topic("the history of tea")
//!     .target_duration(Duration::from_secs(300))
//!     .build();
//! let outcome = coordinator.start(request)?.wait().await;
//! println!("{}", outcome.conversation.transcript());
//! # Ok(())
//! # }
//! ```

mod consumer;
pub mod coordinator;
pub mod events;
mod producer;
pub mod state;

pub use coordinator::{
    Coordinator, PipelineHandle, PipelineOptions, PipelineOutcome, PipelineStatus, PlaybackStart,
};
pub use events::{PipelineEvent, PipelineEventPayload, PipelineEventSink, RunId};
pub use state::{PipelineSnapshot, PipelineState, StageStatus};
