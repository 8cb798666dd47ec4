//! The generation scheduler: seed, continue, conclude until the target
//! duration is covered.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{EventEmitter, PipelineEventPayload};
use super::state::PipelineState;
use crate::audio::AssetStore;
use crate::config::MIN_SEGMENT_DURATION;
use crate::error::{MonologueError, Result};
use crate::generation::{build_prompt, SegmentPhase, TextGenerator};
use crate::speech::SpeechSynthesizer;
use crate::types::Segment;

pub(crate) struct SegmentProducer {
    pub(crate) generator: Arc<dyn TextGenerator>,
    pub(crate) synthesizer: Arc<dyn SpeechSynthesizer>,
    pub(crate) store: AssetStore,
    pub(crate) state: Arc<PipelineState>,
    pub(crate) events: Arc<EventEmitter>,
    pub(crate) completion_threshold: Duration,
    pub(crate) max_segments: usize,
}

impl SegmentProducer {
    /// Produce segments until the accumulated duration reaches the target.
    ///
    /// Returns the number of segments produced. A failed segment leaves the
    /// download cursor and the history untouched.
    pub(crate) async fn run(&self, cancel: CancellationToken) -> Result<usize> {
        let limit = segment_limit(self.max_segments, self.state.snapshot().target);
        loop {
            let conversation = self.state.conversation().await;
            if conversation.is_target_reached() {
                return Ok(conversation.segment_count());
            }

            let index = conversation.segment_count();
            if index >= limit {
                warn!(
                    index,
                    accumulated_secs = conversation.accumulated_duration.as_secs_f64(),
                    "segment cap reached before target"
                );
                return Err(MonologueError::SegmentLimit { limit });
            }

            let plan = SegmentPhase::select(
                index,
                conversation.accumulated_duration,
                conversation.target_duration,
                self.completion_threshold,
            );
            let prompt = build_prompt(
                plan,
                index,
                &conversation.topic,
                conversation.target_duration,
            );
            debug!(index, phase = %plan.phase, is_final = plan.is_final, "requesting segment text");

            let text = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MonologueError::Canceled),
                text = self.generator.generate(&prompt, &conversation.history) => text?,
            };
            self.events.emit(PipelineEventPayload::SegmentGenerated {
                index,
                phase: plan.phase,
                is_final: plan.is_final,
                chars: text.chars().count(),
            });

            let asset = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MonologueError::Canceled),
                asset = self.synthesizer.synthesize(&self.store, index, &text, conversation.voice) => asset?,
            };
            if asset.duration.is_zero() {
                warn!(index, path = %asset.path.display(), "segment probed as zero length");
            }
            let duration = asset.duration;

            let snapshot = self
                .state
                .commit_segment(
                    prompt,
                    Segment {
                        index,
                        phase: plan.phase,
                        text,
                        asset,
                    },
                )
                .await?;

            info!(
                index,
                duration_secs = duration.as_secs_f64(),
                accumulated_secs = snapshot.accumulated.as_secs_f64(),
                target_secs = snapshot.target.as_secs_f64(),
                "segment ready"
            );
            self.events.emit(PipelineEventPayload::SegmentSynthesized {
                index,
                duration_secs: duration.as_secs_f64(),
                accumulated_secs: snapshot.accumulated.as_secs_f64(),
            });
        }
    }
}

/// Segment cap for a target: the configured cap, raised so that a target
/// covered by clips of at least [`MIN_SEGMENT_DURATION`] never hits it.
pub(crate) fn segment_limit(configured: usize, target: Duration) -> usize {
    let needed = (target.as_secs_f64() / MIN_SEGMENT_DURATION.as_secs_f64()).ceil();
    configured.max(needed as usize)
}
