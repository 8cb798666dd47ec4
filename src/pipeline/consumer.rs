//! Plays produced segments in order, never overtaking production.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::events::{EventEmitter, PipelineEventPayload};
use super::state::PipelineState;
use crate::audio::{AssetStore, AudioPlayer};
use crate::error::{MonologueError, Result};

pub(crate) struct PlaybackConsumer {
    pub(crate) player: Arc<dyn AudioPlayer>,
    pub(crate) store: AssetStore,
    pub(crate) state: Arc<PipelineState>,
    pub(crate) events: Arc<EventEmitter>,
}

impl PlaybackConsumer {
    /// Play every segment the producer commits, returning the number played
    /// once production has ended and the playback cursor has caught up.
    pub(crate) async fn run(&self, cancel: CancellationToken) -> Result<usize> {
        let mut rx = self.state.watch();
        let mut cursor = self.state.snapshot().playback_cursor;

        loop {
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MonologueError::Canceled),
                changed = rx.wait_for(|s| s.download_cursor > cursor || s.production.is_terminal()) => {
                    changed.map(|s| s.clone()).map_err(|_| MonologueError::Canceled)?
                }
            };
            if snapshot.download_cursor <= cursor {
                debug!(played = cursor, "playback drained");
                return Ok(cursor);
            }

            let segment = self
                .state
                .segment(cursor)
                .await
                .ok_or_else(|| MonologueError::Sync {
                    index: cursor,
                    path: self.store.path_for(cursor),
                })?;
            let present = tokio::fs::try_exists(&segment.asset.path)
                .await
                .unwrap_or(false);
            if !present {
                return Err(MonologueError::Sync {
                    index: cursor,
                    path: segment.asset.path,
                });
            }

            self.events
                .emit(PipelineEventPayload::PlaybackStarted { index: cursor });
            debug!(index = cursor, duration_secs = segment.asset.duration.as_secs_f64(), "playing segment");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.player.stop();
                    return Err(MonologueError::Canceled);
                }
                played = self.player.play(&segment.asset) => played?,
            }

            self.state.advance_playback(cursor)?;
            self.events
                .emit(PipelineEventPayload::PlaybackFinished { index: cursor });
            cursor += 1;
        }
    }
}
