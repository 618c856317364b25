use tracing::{debug, info};

use crate::error::{RefineError, Result};
use crate::models::{ChunkPlan, ChunkRange, Segment};

/// Partition `segment_count` segments into consecutive ranges of at most
/// `max_chunk_size` segments
///
/// The final range may be shorter. Zero segments yield no ranges.
pub fn plan_chunks(segment_count: usize, max_chunk_size: usize) -> Result<Vec<ChunkRange>> {
    if max_chunk_size == 0 {
        return Err(RefineError::Config(
            "max_chunk_size must be at least 1".to_string(),
        ));
    }

    let mut ranges = Vec::with_capacity(segment_count.div_ceil(max_chunk_size));
    let mut start = 0;

    while start < segment_count {
        let end = (start + max_chunk_size).min(segment_count);
        ranges.push(ChunkRange::new(start, end));
        start = end;
    }

    Ok(ranges)
}

/// Perform Stage 0: plan the chunk arrangement for a segment sequence
pub fn execute_stage0(segments: &[Segment], max_chunk_size: usize) -> Result<ChunkPlan> {
    let ranges = plan_chunks(segments.len(), max_chunk_size)?;

    info!(
        "Chunk arrangement: {} segments in {} chunks",
        segments.len(),
        ranges.len()
    );
    for (index, range) in ranges.iter().enumerate() {
        debug!(
            "Chunk {}: segments {}..{} ({} segments)",
            index + 1,
            range.start_index,
            range.end_index,
            range.len()
        );
    }

    Ok(ChunkPlan {
        ranges,
        segment_count: segments.len(),
    })
}

/// Collapse every whitespace run (newlines included) to one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a chunk as oracle input: one whitespace-normalized line per segment
///
/// Empty segments become empty lines so the line count always equals the
/// segment count.
pub fn linearize(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| normalize_whitespace(&s.text))
        .collect::<Vec<_>>()
        .join("\n")
}
