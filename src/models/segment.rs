use serde::{Deserialize, Serialize};

use crate::error::{RefineError, Result};

/// A timestamped unit of transcript text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Caption text, the only field the refinement pipeline replaces
    pub text: String,
    /// Start timestamp in milliseconds
    pub start_ms: u64,
    /// End timestamp in milliseconds
    pub end_ms: u64,
    /// Display label for the start time (e.g. "1:05"), carried through untouched
    #[serde(default)]
    pub start_time_text: String,
}

impl Segment {
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            start_time_text: String::new(),
        }
    }

    /// Copy of this segment with the text replaced and timing untouched
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// Check the ordering and timing invariants of a segment sequence
pub fn validate_segments(segments: &[Segment]) -> Result<()> {
    let mut previous_start = 0u64;

    for (index, segment) in segments.iter().enumerate() {
        if segment.end_ms < segment.start_ms {
            return Err(RefineError::InvalidSegment {
                index,
                reason: format!(
                    "end {}ms precedes start {}ms",
                    segment.end_ms, segment.start_ms
                ),
            });
        }
        if segment.start_ms < previous_start {
            return Err(RefineError::InvalidSegment {
                index,
                reason: format!(
                    "start {}ms is earlier than the previous segment's start {}ms",
                    segment.start_ms, previous_start
                ),
            });
        }
        previous_start = segment.start_ms;
    }

    Ok(())
}
