//! Monologue: long-form spoken monologues, generated segment by segment.
//!
//! Each segment is written by a chat-completion endpoint, voiced by a
//! text-to-speech endpoint, stored as a numbered clip and played back in
//! order while the next segment is still being produced.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use monologue::prelude::*;
//!
//! # async fn example() -> monologue::error::Result<()> {
//! let config = MonologueConfig::from_env()?;
//! let coordinator = Coordinator::new(
//!     Arc::new(OpenAiChatClient::from_config(&config)?),
//!     Arc::new(SpeechSynthesisClient::new(
//!         Arc::new(OpenAiSpeechProvider::from_config(&config)?),
//!         Arc::new(SymphoniaProbe),
//!     )),
//!     Arc::new(SimulatedPlayer::new()),
//!     PipelineOptions::from_config(&config),
//! );
//!
//! let request = PodcastRequest::from_minutes("deep sea vents", Voice::Nova, 3.0)?;
//! let handle = coordinator.start(request)?;
//! let outcome = handle.wait().await;
//! println!("{}", outcome.conversation.transcript());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod generation;
pub mod http;
pub mod pipeline;
pub mod prelude;
pub mod speech;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
