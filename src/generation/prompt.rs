//! Prompt phases for the segment generation state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Remaining-duration margin under which the next segment must wrap up.
pub const COMPLETION_THRESHOLD: Duration = Duration::from_secs(90);

/// Approximate spoken length of one segment, used to tell the model what
/// share of the whole monologue a single segment should cover.
/// The share is this length over the target, so it shrinks as targets grow.
pub const NOMINAL_SEGMENT_SECS: f64 = 85.0;

/// Prompt-construction phase for one segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentPhase {
    Seed,
    Continue,
    Conclude,
}

/// Phase chosen for an iteration, plus whether the segment is the last one
/// expected before the target is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub phase: SegmentPhase,
    pub is_final: bool,
}

impl SegmentPhase {
    /// Choose the phase for segment `index` from the current running total.
    ///
    /// Index 0 is always `Seed`, even when the target is already inside the
    /// completion threshold; such a seed is flagged `is_final`.
    pub fn select(
        index: usize,
        accumulated: Duration,
        target: Duration,
        threshold: Duration,
    ) -> PhasePlan {
        let is_final = target.saturating_sub(accumulated) < threshold;
        let phase = if index == 0 {
            SegmentPhase::Seed
        } else if is_final {
            SegmentPhase::Conclude
        } else {
            SegmentPhase::Continue
        };
        PhasePlan { phase, is_final }
    }
}

/// Share of the whole monologue a single segment should cover, in percent.
pub fn share_percent(target: Duration) -> f64 {
    let target_secs = target.as_secs_f64();
    if target_secs <= 0.0 {
        return 100.0;
    }
    (NOMINAL_SEGMENT_SECS / target_secs * 100.0).min(100.0)
}

/// Build the user prompt for one segment.
pub fn build_prompt(plan: PhasePlan, index: usize, topic: &str, target: Duration) -> String {
    let share = share_percent(target);
    let topic = topic.trim();
    match (plan.phase, plan.is_final) {
        (SegmentPhase::Seed, false) => format!(
            "Generate a podcast monologue on the topic of {topic}. This is the first segment of \
             a multi-part series, so do not round off your ending and leave space for \
             continuation in future prompts. The length of this segment should be approximately \
             {share:.1}% of the total monologue. Ensure the content is factual, engaging, and \
             informative. Avoid any prefaces or introductions, and do not include any extraneous \
             text. You may use humor and explore related tangents as long as they remain relevant."
        ),
        (SegmentPhase::Seed, true) => format!(
            "Generate a complete podcast monologue on the topic of {topic}. This single segment \
             is the whole monologue, so open the topic and close it with a comprehensive and \
             conclusive ending. Ensure the content is factual, engaging, and informative. Avoid \
             any prefaces or introductions, and do not include any extraneous text."
        ),
        (SegmentPhase::Continue, _) => format!(
            "Continue the monologue on the topic of {topic}. This is segment {ordinal} of the \
             series, and it should be approximately {share:.1}% of the total monologue. Maintain \
             a consistent pacing and ensure the content flows logically from the previous \
             segments. Do not repeat earlier framing, and do not include any prefaces, \
             introductions, or text other than the monologue itself.",
            ordinal = index + 1,
        ),
        (SegmentPhase::Conclude, _) => format!(
            "Complete the monologue on the topic of {topic}. This is the final segment of the \
             series and no further continuation will follow. Conclude with a comprehensive and \
             impactful ending that ties together the key points. The response should not include \
             any prefaces, introductions, or any text other than the monologue itself."
        ),
    }
}
