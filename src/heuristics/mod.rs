pub mod alignment;
pub mod similarity;

pub use alignment::*;
pub use similarity::*;

/// Configuration for similarity-based mismatch recovery
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Score added for every segment or line left unpaired
    pub gap_penalty: f64,
    /// Weight of the character ratio; the word Jaccard gets the remainder
    pub char_weight: f64,
    /// Number of trailing segments per chunk subject to the length check
    pub tail_guard_size: usize,
    /// Maximum relative length change accepted inside the tail guard
    pub length_tolerance: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            gap_penalty: -0.30,
            char_weight: 0.7,
            tail_guard_size: 5,
            length_tolerance: 0.10,
        }
    }
}

/// Pair each original segment text with at most one oracle line
///
/// Runs the global alignment then the tail guard. `None` means the segment
/// keeps its original text.
pub fn align_chunk(
    originals: &[&str],
    lines: &[&str],
    config: &SimilarityConfig,
) -> Vec<Option<usize>> {
    let mut mapping = align_lines(originals, lines, config);
    apply_tail_guard(&mut mapping, originals, lines, config);
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_config_default() {
        let config = SimilarityConfig::default();
        assert_eq!(config.gap_penalty, -0.30);
        assert_eq!(config.tail_guard_size, 5);
        assert_eq!(config.length_tolerance, 0.10);
    }

    #[test]
    fn test_align_chunk_keeps_order() {
        let originals = ["alpha beta", "gamma delta", "epsilon zeta"];
        let lines = ["alpha beta", "epsilon zeta"];

        let mapping = align_chunk(&originals, &lines, &SimilarityConfig::default());

        assert_eq!(mapping, vec![Some(0), None, Some(1)]);
    }
}
