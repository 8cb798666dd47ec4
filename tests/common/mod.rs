//! Shared test helpers: scripted generator, synthesizer and player.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use monologue::audio::{AssetStore, AudioPlayer, SimulatedPlayer};
use monologue::error::{MonologueError, Result};
use monologue::generation::TextGenerator;
use monologue::pipeline::{PipelineEvent, PipelineEventPayload, PipelineEventSink};
use monologue::speech::SpeechSynthesizer;
use monologue::types::{AudioAsset, HistoryEntry, Voice};

/// A prompt as seen by the generator, with the history length it came with.
#[derive(Debug, Clone)]
pub struct SeenPrompt {
    pub prompt: String,
    pub history_len: usize,
}

/// Generator returning `segment <n>` after an optional delay.
#[derive(Default)]
pub struct ScriptedGenerator {
    delay: Duration,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
    started: AtomicUsize,
    finished: AtomicUsize,
    prompts: Mutex<Vec<SeenPrompt>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Panic instead of answering the call with this index.
    pub fn panicking_at(mut self, index: usize) -> Self {
        self.panic_at = Some(index);
        self
    }

    pub fn prompts(&self) -> Vec<SeenPrompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, history: &[HistoryEntry]) -> Result<String> {
        let index = self.started.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(SeenPrompt {
            prompt: prompt.to_string(),
            history_len: history.len(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic_at == Some(index) {
            panic!("generator crashed on call {index}");
        }
        if self.fail_at == Some(index) {
            return Err(MonologueError::api(500, "model overloaded"));
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(format!("segment {index}"))
    }
}

/// Synthesizer writing a placeholder clip with a scripted duration.
///
/// Index `i` gets `durations[i]`, or the last duration once the list runs out.
pub struct ScriptedSynthesizer {
    durations: Vec<Duration>,
    delay: Duration,
    fail_at: Option<usize>,
    vanish_at: Option<usize>,
    calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn new(durations_secs: &[u64]) -> Self {
        Self {
            durations: durations_secs.iter().map(|s| Duration::from_secs(*s)).collect(),
            delay: Duration::ZERO,
            fail_at: None,
            vanish_at: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail with a bad status for this index, writing nothing.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Report success for this index but leave no file behind.
    pub fn vanishing_at(mut self, index: usize) -> Self {
        self.vanish_at = Some(index);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn duration_for(&self, index: usize) -> Duration {
        self.durations
            .get(index)
            .or_else(|| self.durations.last())
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(
        &self,
        store: &AssetStore,
        index: usize,
        text: &str,
        _voice: Voice,
    ) -> Result<AudioAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_at == Some(index) {
            return Err(MonologueError::api(503, "speech backend unavailable"));
        }

        let path = store.write(index, text.as_bytes()).await?;
        if self.vanish_at == Some(index) {
            std::fs::remove_file(&path).unwrap();
        }
        Ok(AudioAsset {
            index,
            path,
            duration: self.duration_for(index),
        })
    }
}

/// Simulated player that records what it played and checks each clip is on
/// disk when playback begins.
#[derive(Default)]
pub struct RecordingPlayer {
    inner: SimulatedPlayer,
    played: Mutex<Vec<usize>>,
    missing: Mutex<Vec<usize>>,
    stops: AtomicUsize,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<usize> {
        self.played.lock().unwrap().clone()
    }

    pub fn missing(&self) -> Vec<usize> {
        self.missing.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, asset: &AudioAsset) -> Result<()> {
        if !asset.path.is_file() {
            self.missing.lock().unwrap().push(asset.index);
        }
        self.inner.play(asset).await?;
        self.played.lock().unwrap().push(asset.index);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.stop();
    }
}

/// Event sink collecting every event for later inspection.
pub fn collecting_sink() -> (PipelineEventSink, Arc<Mutex<Vec<PipelineEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);
    let sink: PipelineEventSink = Arc::new(move |event: PipelineEvent| {
        sink_events.lock().unwrap().push(event);
    });
    (sink, events)
}

/// Position of the first event matching `pred`.
pub fn position(
    events: &[PipelineEvent],
    pred: impl Fn(&PipelineEventPayload) -> bool,
) -> Option<usize> {
    events.iter().position(|e| pred(&e.payload))
}
