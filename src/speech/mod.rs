//! Speech synthesis: endpoint provider plus the client that turns a text
//! segment into a durable, probed audio asset.

pub mod openai;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::audio::probe::DurationProbe;
use crate::audio::store::AssetStore;
use crate::error::{MonologueError, Result};
use crate::types::{AudioAsset, Voice};

pub use openai::OpenAiSpeechProvider;
pub use types::{AudioFormat, SpeechRequest};

/// Trait for text-to-speech endpoints.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Generate speech audio bytes from text.
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>>;
}

/// Converts one segment's text into an audio asset in a store.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` for segment `index`.
    ///
    /// A provider failure writes nothing at the index's path.
    async fn synthesize(
        &self,
        store: &AssetStore,
        index: usize,
        text: &str,
        voice: Voice,
    ) -> Result<AudioAsset>;
}

/// Provider call, durable write and duration probe for one segment.
#[derive(Clone)]
pub struct SpeechSynthesisClient {
    provider: Arc<dyn SpeechProvider>,
    probe: Arc<dyn DurationProbe>,
}

impl SpeechSynthesisClient {
    pub fn new(provider: Arc<dyn SpeechProvider>, probe: Arc<dyn DurationProbe>) -> Self {
        Self { provider, probe }
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechSynthesisClient {
    async fn synthesize(
        &self,
        store: &AssetStore,
        index: usize,
        text: &str,
        voice: Voice,
    ) -> Result<AudioAsset> {
        let request = SpeechRequest::new(text, voice, store.format());
        let audio = self.provider.generate_speech(&request).await?;
        let path = store.write(index, &audio).await?;

        let probe = Arc::clone(&self.probe);
        let probe_path = path.clone();
        let duration = tokio::task::spawn_blocking(move || probe.probe(&probe_path))
            .await
            .map_err(|err| MonologueError::AudioProbe {
                path: path.clone(),
                message: err.to_string(),
            })??;

        debug!(index, bytes = audio.len(), duration_secs = duration.as_secs_f64(), "segment audio stored");

        Ok(AudioAsset {
            index,
            path,
            duration,
        })
    }
}
