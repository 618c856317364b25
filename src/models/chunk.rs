use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Segment;

/// Half-open slice `[start_index, end_index)` of the segment sequence
/// processed as one oracle request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl ChunkRange {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    /// Number of segments in this chunk
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    /// The segments this range covers
    pub fn slice<'a>(&self, segments: &'a [Segment]) -> &'a [Segment] {
        &segments[self.as_range()]
    }
}

/// Planned chunk ranges for one run
#[derive(Debug, Clone, Default)]
pub struct ChunkPlan {
    pub ranges: Vec<ChunkRange>,
    /// Total number of segments the plan covers
    pub segment_count: usize,
}

impl ChunkPlan {
    pub fn total_chunks(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate `(chunk_index, range)` pairs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChunkRange)> {
        self.ranges.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_range_slice() {
        let segments: Vec<Segment> = (0..6)
            .map(|i| Segment::new(format!("s{}", i), i * 1_000, i * 1_000 + 900))
            .collect();
        let range = ChunkRange::new(2, 5);

        let slice = range.slice(&segments);

        assert_eq!(range.len(), 3);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].text, "s2");
        assert_eq!(slice[2].text, "s4");
    }

    #[test]
    fn test_empty_range() {
        let range = ChunkRange::new(4, 4);
        assert!(range.is_empty());
        assert_eq!(range.as_range(), 4..4);
    }
}
