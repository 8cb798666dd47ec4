//! Pipeline event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::SegmentPhase;
use crate::types::Voice;

/// Unique run identifier. Equal to the conversation id.
pub type RunId = Uuid;

/// Callback receiving every event of a run, in emission order.
pub type PipelineEventSink = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Concrete event payloads emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEventPayload {
    Started {
        topic: String,
        voice: Voice,
        target_secs: f64,
    },
    SegmentGenerated {
        index: usize,
        phase: SegmentPhase,
        is_final: bool,
        chars: usize,
    },
    SegmentSynthesized {
        index: usize,
        duration_secs: f64,
        accumulated_secs: f64,
    },
    PlaybackStarted {
        index: usize,
    },
    PlaybackFinished {
        index: usize,
    },
    ProductionFinished {
        segments: usize,
        accumulated_secs: f64,
    },
    Completed,
    Failed {
        error: String,
    },
    Canceled,
}

/// Envelope for pipeline events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: PipelineEventPayload,
}

/// Numbers and forwards events to the optional sink.
pub(crate) struct EventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<PipelineEventSink>,
}

impl EventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<PipelineEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(0),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: PipelineEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let event = PipelineEvent {
            run_id: self.run_id,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            payload,
        };
        sink(event);
    }
}
