//! Coordinator: starts production, gates playback on it, and reports the
//! outcome of a run through a [`PipelineHandle`].

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures::stream::{BoxStream, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::consumer::PlaybackConsumer;
use super::events::{EventEmitter, PipelineEventPayload, PipelineEventSink, RunId};
use super::producer::SegmentProducer;
use super::state::{PipelineSnapshot, PipelineState, StageStatus};
use crate::audio::{AssetStore, AudioPlayer};
use crate::config::{default_output_dir, MonologueConfig, DEFAULT_MAX_SEGMENTS};
use crate::error::{MonologueError, Result};
use crate::generation::{TextGenerator, COMPLETION_THRESHOLD};
use crate::speech::{AudioFormat, SpeechSynthesizer};
use crate::types::{Conversation, PodcastRequest};

/// When the playback consumer may begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackStart {
    /// Play segment 0 while later segments are still being produced.
    #[default]
    AfterFirstSegment,
    /// Wait until the whole monologue has been produced.
    AfterProduction,
}

/// Options for a pipeline run.
#[derive(Clone, Builder)]
pub struct PipelineOptions {
    #[builder(default = COMPLETION_THRESHOLD)]
    pub completion_threshold: Duration,
    /// Guard against clips that probe as zero length. Raised per run to
    /// cover the target with clips of [`MIN_SEGMENT_DURATION`].
    ///
    /// [`MIN_SEGMENT_DURATION`]: crate::config::MIN_SEGMENT_DURATION
    #[builder(default = DEFAULT_MAX_SEGMENTS)]
    pub max_segments: usize,
    #[builder(default)]
    pub playback_start: PlaybackStart,
    #[builder(default = true)]
    pub playback_enabled: bool,
    #[builder(default)]
    pub format: AudioFormat,
    /// Root under which each conversation gets its own asset directory.
    #[builder(into, default = default_output_dir())]
    pub output_dir: PathBuf,
    pub event_sink: Option<PipelineEventSink>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("completion_threshold", &self.completion_threshold)
            .field("max_segments", &self.max_segments)
            .field("playback_start", &self.playback_start)
            .field("playback_enabled", &self.playback_enabled)
            .field("format", &self.format)
            .field("output_dir", &self.output_dir)
            .field("event_sink", &self.event_sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl PipelineOptions {
    /// Options seeded from configuration: asset root and segment cap.
    pub fn from_config(config: &MonologueConfig) -> Self {
        Self {
            max_segments: config.max_segments,
            output_dir: config.output_dir.clone(),
            ..Self::default()
        }
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    Failed,
    Canceled,
}

/// Result of a run. The conversation keeps every committed segment even
/// when the run failed or was canceled.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub status: PipelineStatus,
    pub conversation: Conversation,
    pub error: Option<MonologueError>,
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == PipelineStatus::Completed
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    run_id: RunId,
    state: Arc<PipelineState>,
    cancel: CancellationToken,
    asset_dir: PathBuf,
    result_rx: oneshot::Receiver<PipelineOutcome>,
}

impl PipelineHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Directory holding this run's clips and record files.
    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<PipelineSnapshot> {
        self.state.watch()
    }

    /// Stream of snapshots, starting with the current one. Ends after the
    /// run reaches a terminal state.
    pub fn snapshots(&self) -> BoxStream<'static, PipelineSnapshot> {
        let rx = self.state.watch();
        futures::stream::unfold((rx, true, false), |(mut rx, first, done)| async move {
            if done || (!first && rx.changed().await.is_err()) {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            let done = snapshot.is_terminal();
            Some((snapshot, (rx, false, done)))
        })
        .boxed()
    }

    /// Whether the full transcript and all audio are ready and played.
    pub fn is_complete(&self) -> bool {
        self.state.snapshot().is_complete()
    }

    /// Cancel the run: stops playback and drops in-flight requests.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token canceled together with the run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn conversation(&self) -> Conversation {
        self.state.conversation().await
    }

    /// Wait for the run to end.
    pub async fn wait(self) -> PipelineOutcome {
        match self.result_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.cancel.cancel();
                self.state.abort();
                PipelineOutcome {
                    status: PipelineStatus::Failed,
                    conversation: self.state.conversation().await,
                    error: Some(MonologueError::Aborted(
                        "run ended without reporting an outcome".to_string(),
                    )),
                }
            }
        }
    }
}

/// Starts runs of the segmented generation pipeline.
#[derive(Clone)]
pub struct Coordinator {
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    options: PipelineOptions,
}

impl Coordinator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            player,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Validate the request and spawn the run. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, request: PodcastRequest) -> Result<PipelineHandle> {
        request.validate()?;
        if self.options.max_segments == 0 {
            return Err(MonologueError::InvalidArgument(
                "max_segments must be at least 1".to_string(),
            ));
        }

        let conversation = Conversation::new(&request);
        let run_id = conversation.id;
        let store =
            AssetStore::for_conversation(&self.options.output_dir, run_id, self.options.format);
        let asset_dir = store.dir().to_path_buf();

        let state = Arc::new(PipelineState::new(conversation));
        let events = Arc::new(EventEmitter::new(run_id, self.options.event_sink.clone()));
        let cancel = CancellationToken::new();
        let (result_tx, result_rx) = oneshot::channel();

        let producer = SegmentProducer {
            generator: Arc::clone(&self.generator),
            synthesizer: Arc::clone(&self.synthesizer),
            store: store.clone(),
            state: Arc::clone(&state),
            events: Arc::clone(&events),
            completion_threshold: self.options.completion_threshold,
            max_segments: self.options.max_segments,
        };
        let consumer = self.options.playback_enabled.then(|| PlaybackConsumer {
            player: Arc::clone(&self.player),
            store,
            state: Arc::clone(&state),
            events: Arc::clone(&events),
        });

        info!(
            run_id = %run_id,
            topic = %request.topic.trim(),
            voice = %request.voice,
            target_secs = request.target_duration.as_secs_f64(),
            "monologue run started"
        );
        events.emit(PipelineEventPayload::Started {
            topic: request.topic.trim().to_string(),
            voice: request.voice,
            target_secs: request.target_duration.as_secs_f64(),
        });

        let run = Run {
            run_id,
            state: Arc::clone(&state),
            events,
            playback_start: self.options.playback_start,
            cancel: cancel.clone(),
        };
        tokio::spawn(async move {
            let aborted = run.clone();
            let outcome = match AssertUnwindSafe(run.drive(producer, consumer))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => aborted.abort(panic_message(panic.as_ref())).await,
            };
            let _ = result_tx.send(outcome);
        });

        Ok(PipelineHandle {
            run_id,
            state,
            cancel,
            asset_dir,
            result_rx,
        })
    }
}

#[derive(Clone)]
struct Run {
    run_id: RunId,
    state: Arc<PipelineState>,
    events: Arc<EventEmitter>,
    playback_start: PlaybackStart,
    cancel: CancellationToken,
}

impl Run {
    /// Settle a run whose driver panicked: unfinished stages fail and the
    /// outcome carries an `Aborted` error.
    async fn abort(self, message: String) -> PipelineOutcome {
        error!(run_id = %self.run_id, panic = %message, "monologue run aborted");
        self.cancel.cancel();
        self.state.abort();

        let err = MonologueError::Aborted(message);
        let events = &self.events;
        let payload = PipelineEventPayload::Failed {
            error: err.to_string(),
        };
        // The sink itself may be what panicked.
        if std::panic::catch_unwind(AssertUnwindSafe(|| events.emit(payload))).is_err() {
            warn!(run_id = %self.run_id, "event sink panicked while reporting the abort");
        }

        PipelineOutcome {
            status: PipelineStatus::Failed,
            conversation: self.state.conversation().await,
            error: Some(err),
        }
    }

    async fn drive(
        self,
        producer: SegmentProducer,
        consumer: Option<PlaybackConsumer>,
    ) -> PipelineOutcome {
        let production = async {
            self.state.set_production(StageStatus::Running);
            let result = producer.run(self.cancel.clone()).await;
            match &result {
                Ok(segments) => {
                    let accumulated = self.state.snapshot().accumulated;
                    self.events.emit(PipelineEventPayload::ProductionFinished {
                        segments: *segments,
                        accumulated_secs: accumulated.as_secs_f64(),
                    });
                    self.state.set_production(StageStatus::Completed);
                }
                Err(MonologueError::Canceled) => self.state.set_production(StageStatus::Canceled),
                Err(err) => {
                    warn!(run_id = %self.run_id, error = %err, "segment production failed");
                    self.state.set_production(StageStatus::Failed);
                    self.cancel.cancel();
                }
            }
            result
        };

        let playback = async {
            let Some(consumer) = consumer else {
                self.state.set_playback(StageStatus::Skipped);
                return Ok(0);
            };
            if !self.playback_gate().await {
                self.state.set_playback(StageStatus::Canceled);
                return Err(MonologueError::Canceled);
            }

            self.state.set_playback(StageStatus::Running);
            let result = consumer.run(self.cancel.clone()).await;
            match &result {
                Ok(_) => self.state.set_playback(StageStatus::Completed),
                Err(MonologueError::Canceled) => self.state.set_playback(StageStatus::Canceled),
                Err(err) => {
                    warn!(run_id = %self.run_id, error = %err, "playback failed");
                    self.state.set_playback(StageStatus::Failed);
                    self.cancel.cancel();
                }
            }
            result
        };

        let (production, playback) = tokio::join!(production, playback);

        let error = [production.err(), playback.err()]
            .into_iter()
            .flatten()
            .find(|err| !matches!(err, MonologueError::Canceled));

        if let Some(err) = error {
            self.events.emit(PipelineEventPayload::Failed {
                error: err.to_string(),
            });
            return PipelineOutcome {
                status: PipelineStatus::Failed,
                conversation: self.state.conversation().await,
                error: Some(err),
            };
        }

        if self.cancel.is_cancelled() {
            debug!(run_id = %self.run_id, "monologue run canceled");
            self.events.emit(PipelineEventPayload::Canceled);
            return PipelineOutcome {
                status: PipelineStatus::Canceled,
                conversation: self.state.conversation().await,
                error: None,
            };
        }

        let conversation = self.state.finish().await;
        info!(
            run_id = %self.run_id,
            segments = conversation.segment_count(),
            accumulated_secs = conversation.accumulated_duration.as_secs_f64(),
            "monologue run completed"
        );
        self.events.emit(PipelineEventPayload::Completed);
        PipelineOutcome {
            status: PipelineStatus::Completed,
            conversation,
            error: None,
        }
    }

    /// Wait until playback may begin. False when the run ends first.
    async fn playback_gate(&self) -> bool {
        let mut rx = self.state.watch();
        let start = self.playback_start;
        let ready = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            ready = rx.wait_for(|s| match start {
                PlaybackStart::AfterFirstSegment => {
                    s.download_cursor > 0 || s.production.is_terminal()
                }
                PlaybackStart::AfterProduction => s.production.is_terminal(),
            }) => ready.map(|s| s.production.is_success() || !s.production.is_terminal()),
        };
        matches!(ready, Ok(true))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
