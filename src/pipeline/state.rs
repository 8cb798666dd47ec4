//! Shared pipeline state: the conversation plus the observable cursors.
//!
//! The producer is the only writer of the download cursor and accumulated
//! duration; the consumer is the only writer of the playback cursor. Both
//! observe each other through the snapshot watch channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::{watch, RwLock};

use crate::error::{MonologueError, Result};
use crate::types::{Conversation, HistoryEntry, Segment};

/// Lifecycle of one pipeline stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    /// Playback disabled for this run.
    Skipped,
    Failed,
    Canceled,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Skipped | Self::Failed | Self::Canceled
        )
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

/// Point-in-time view of the pipeline's cursors and stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Next segment index to produce.
    pub download_cursor: usize,
    /// Next segment index to play.
    pub playback_cursor: usize,
    pub accumulated: Duration,
    pub target: Duration,
    pub production: StageStatus,
    pub playback: StageStatus,
}

impl PipelineSnapshot {
    /// Transcript and every clip are ready, and playback has ended.
    pub fn is_complete(&self) -> bool {
        self.production == StageStatus::Completed && self.playback.is_success()
    }

    pub fn is_terminal(&self) -> bool {
        self.production.is_terminal() && self.playback.is_terminal()
    }
}

pub struct PipelineState {
    conversation: RwLock<Conversation>,
    snapshot_tx: watch::Sender<PipelineSnapshot>,
}

impl PipelineState {
    pub fn new(conversation: Conversation) -> Self {
        let initial = PipelineSnapshot {
            download_cursor: conversation.segment_count(),
            playback_cursor: 0,
            accumulated: conversation.accumulated_duration,
            target: conversation.target_duration,
            production: StageStatus::Pending,
            playback: StageStatus::Pending,
        };
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            conversation: RwLock::new(conversation),
            snapshot_tx,
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current copy of the conversation.
    pub async fn conversation(&self) -> Conversation {
        self.conversation.read().await.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.conversation.read().await.history.clone()
    }

    pub async fn segment(&self, index: usize) -> Option<Segment> {
        self.conversation.read().await.segments.get(index).cloned()
    }

    /// Append an accepted segment and advance the download cursor.
    ///
    /// The conversation and the published cursor change under the same
    /// write lock, so readers never see a cursor ahead of the segments.
    pub async fn commit_segment(
        &self,
        prompt: impl Into<String>,
        segment: Segment,
    ) -> Result<PipelineSnapshot> {
        let mut conversation = self.conversation.write().await;
        conversation.push_segment(prompt, segment)?;
        let download_cursor = conversation.segment_count();
        let accumulated = conversation.accumulated_duration;
        self.snapshot_tx.send_modify(|s| {
            s.download_cursor = download_cursor;
            s.accumulated = accumulated;
        });
        Ok(self.snapshot())
    }

    /// Record that segment `index` finished playing.
    pub fn advance_playback(&self, index: usize) -> Result<()> {
        let mut result = Ok(());
        self.snapshot_tx.send_if_modified(|s| {
            if index != s.playback_cursor || index >= s.download_cursor {
                result = Err(MonologueError::InvalidArgument(format!(
                    "playback cursor {} cannot advance past segment {index} with download cursor {}",
                    s.playback_cursor, s.download_cursor
                )));
                return false;
            }
            s.playback_cursor = index + 1;
            true
        });
        result
    }

    pub fn set_production(&self, status: StageStatus) {
        self.snapshot_tx.send_if_modified(|s| {
            let changed = s.production != status;
            s.production = status;
            changed
        });
    }

    pub fn set_playback(&self, status: StageStatus) {
        self.snapshot_tx.send_if_modified(|s| {
            let changed = s.playback != status;
            s.playback = status;
            changed
        });
    }

    /// Mark every stage that has not ended as failed.
    pub(crate) fn abort(&self) {
        self.snapshot_tx.send_if_modified(|s| {
            let mut changed = false;
            for stage in [&mut s.production, &mut s.playback] {
                if !stage.is_terminal() {
                    *stage = StageStatus::Failed;
                    changed = true;
                }
            }
            changed
        });
    }

    pub(crate) async fn finish(&self) -> Conversation {
        let mut conversation = self.conversation.write().await;
        conversation.mark_finished();
        conversation.clone()
    }
}
