use serde::{Deserialize, Serialize};

/// How a line-count mismatch in one chunk was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchResolution {
    /// Oracle returned too few lines; trailing segments kept their original text
    FilledFromOriginal,
    /// Oracle returned too many lines; the surplus was discarded
    SurplusDiscarded,
    /// Lines were matched to segments by text similarity
    SimilarityAligned,
}

/// Diagnostic for a chunk whose oracle output did not have one line per segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCountMismatch {
    /// 0-based chunk index
    pub chunk_index: usize,
    /// Number of segments in the chunk
    pub expected: usize,
    /// Number of lines the oracle returned
    pub actual: usize,
    pub resolution: MismatchResolution,
}

/// Everything realignment observed while mapping oracle lines back onto segments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealignmentReport {
    /// One entry per mismatched chunk, in chunk order
    pub mismatches: Vec<LineCountMismatch>,
    /// Segments whose original text was kept because no usable line mapped to them
    pub segments_kept_original: usize,
    /// Oracle lines that were dropped
    pub lines_discarded: usize,
    /// Blank oracle lines replaced by the segment's original text
    pub blank_line_fallbacks: usize,
}

impl RealignmentReport {
    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    /// Fold another chunk's report into this one
    pub fn merge(&mut self, other: RealignmentReport) {
        self.mismatches.extend(other.mismatches);
        self.segments_kept_original += other.segments_kept_original;
        self.lines_discarded += other.lines_discarded;
        self.blank_line_fallbacks += other.blank_line_fallbacks;
    }
}
