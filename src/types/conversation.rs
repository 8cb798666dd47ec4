//! Conversation aggregate, its segments and the request that creates it.

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::HistoryEntry;
use super::voice::Voice;
use crate::error::{MonologueError, Result};
use crate::generation::prompt::SegmentPhase;

/// Separator placed between segment texts in the final transcript.
pub const TRANSCRIPT_SEPARATOR: &str = "\n \n";

const MAX_TITLE_CHARS: usize = 60;

/// A user's generation request.
///
/// ```
/// use std::time::Duration;
/// use monologue::types::{PodcastRequest, Voice};
///
/// let request = PodcastRequest::builder()
///     .topic("the fall of Rome")
///     .voice(Voice::Onyx)
///     .target_duration(Duration::from_secs(5 * 60))
///     .build();
/// assert_eq!(request.voice, Voice::Onyx);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct PodcastRequest {
    #[builder(into)]
    pub topic: String,
    #[builder(default)]
    pub voice: Voice,
    pub target_duration: Duration,
    #[builder(into)]
    pub title: Option<String>,
}

impl PodcastRequest {
    /// Convenience for the original UI's minute slider.
    pub fn from_minutes(topic: impl Into<String>, voice: Voice, minutes: f64) -> Result<Self> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(MonologueError::InvalidArgument(format!(
                "Target length must be a positive number of minutes, got {minutes}"
            )));
        }
        Ok(Self {
            topic: topic.into(),
            voice,
            target_duration: Duration::from_secs_f64(minutes * 60.0),
            title: None,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(MonologueError::InvalidArgument(
                "Topic description cannot be empty".to_string(),
            ));
        }
        if self.target_duration.is_zero() {
            return Err(MonologueError::InvalidArgument(
                "Target duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A synthesized clip persisted in the asset store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioAsset {
    pub index: usize,
    pub path: PathBuf,
    /// Playable length as probed from the written file.
    pub duration: Duration,
}

/// One unit of generated text plus its synthesized clip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub phase: SegmentPhase,
    pub text: String,
    pub asset: AudioAsset,
}

/// The aggregate root for one generated monologue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub voice: Voice,
    pub topic: String,
    pub target_duration: Duration,
    pub segments: Vec<Segment>,
    /// User/assistant pairs, one pair per accepted segment.
    pub history: Vec<HistoryEntry>,
    pub accumulated_duration: Duration,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(request: &PodcastRequest) -> Self {
        let title = request
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| title_from_topic(&request.topic));
        Self {
            id: Uuid::new_v4(),
            title,
            voice: request.voice,
            topic: request.topic.trim().to_string(),
            target_duration: request.target_duration,
            segments: Vec::new(),
            history: Vec::new(),
            accumulated_duration: Duration::ZERO,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append an accepted segment together with the prompt that produced it.
    ///
    /// Indices must be contiguous, and a finished conversation is read-only.
    pub fn push_segment(&mut self, prompt: impl Into<String>, segment: Segment) -> Result<()> {
        if self.finished_at.is_some() {
            return Err(MonologueError::InvalidArgument(format!(
                "Conversation {} is finished and cannot accept segment {}",
                self.id, segment.index
            )));
        }
        if segment.index != self.segments.len() || segment.asset.index != segment.index {
            return Err(MonologueError::InvalidArgument(format!(
                "Segment index {} out of order; expected {}",
                segment.index,
                self.segments.len()
            )));
        }

        self.history.push(HistoryEntry::user(prompt));
        self.history.push(HistoryEntry::assistant(segment.text.clone()));
        self.accumulated_duration += segment.asset.duration;
        self.segments.push(segment);
        Ok(())
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_target_reached(&self) -> bool {
        self.accumulated_duration >= self.target_duration
    }

    /// Target minus accumulated duration, saturating at zero.
    pub fn remaining(&self) -> Duration {
        self.target_duration.saturating_sub(self.accumulated_duration)
    }

    /// Full transcript of every accepted segment, in order.
    pub fn transcript(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(TRANSCRIPT_SEPARATOR)
    }

    pub fn mark_finished(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

fn title_from_topic(topic: &str) -> String {
    let topic = topic.trim();
    let mut chars = topic.chars();
    let mut title: String = chars
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();
    title.extend(chars.take(MAX_TITLE_CHARS.saturating_sub(1)));
    if topic.chars().count() > MAX_TITLE_CHARS {
        title.push('…');
    }
    title
}
