use super::{SimilarityConfig, line_similarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Segment paired with a line
    Match,
    /// Segment left without a line
    SkipSegment,
    /// Line left without a segment
    SkipLine,
}

/// Globally align original segment texts to oracle lines
///
/// Returns, for each original, the index of the line it was paired with.
/// Pairing preserves order on both sides. Gaps cost `gap_penalty`; pairs
/// score their similarity.
pub fn align_lines(
    originals: &[&str],
    lines: &[&str],
    config: &SimilarityConfig,
) -> Vec<Option<usize>> {
    let n = originals.len();
    let m = lines.len();
    if n == 0 {
        return Vec::new();
    }

    let mut score = vec![vec![f64::NEG_INFINITY; m + 1]; n + 1];
    let mut step = vec![vec![None::<Step>; m + 1]; n + 1];
    score[0][0] = 0.0;

    for i in 1..=n {
        score[i][0] = score[i - 1][0] + config.gap_penalty;
        step[i][0] = Some(Step::SkipSegment);
    }
    for j in 1..=m {
        score[0][j] = score[0][j - 1] + config.gap_penalty;
        step[0][j] = Some(Step::SkipLine);
    }

    for i in 1..=n {
        for j in 1..=m {
            let similarity = line_similarity(originals[i - 1], lines[j - 1], config.char_weight);
            let mut best = score[i - 1][j - 1] + similarity;
            let mut best_step = Step::Match;

            let skip_segment = score[i - 1][j] + config.gap_penalty;
            if skip_segment > best {
                best = skip_segment;
                best_step = Step::SkipSegment;
            }

            let skip_line = score[i][j - 1] + config.gap_penalty;
            if skip_line > best {
                best = skip_line;
                best_step = Step::SkipLine;
            }

            score[i][j] = best;
            step[i][j] = Some(best_step);
        }
    }

    let mut mapping = vec![None; n];
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match step[i][j] {
            Some(Step::Match) if i > 0 && j > 0 => {
                mapping[i - 1] = Some(j - 1);
                i -= 1;
                j -= 1;
            }
            Some(Step::SkipLine) if j > 0 => j -= 1,
            _ if i > 0 => i -= 1,
            _ => j -= 1,
        }
    }

    mapping
}

/// Drop pairings near the end of a chunk whose length drifts too far
///
/// Oracles most often merge or split lines at chunk ends, so the last
/// `tail_guard_size` segments only accept a line within `length_tolerance`
/// of the original's length.
pub fn apply_tail_guard(
    mapping: &mut [Option<usize>],
    originals: &[&str],
    lines: &[&str],
    config: &SimilarityConfig,
) {
    let tail_start = originals.len().saturating_sub(config.tail_guard_size);

    for index in tail_start..originals.len() {
        let Some(line_index) = mapping[index] else {
            continue;
        };
        let candidate_len = lines[line_index].chars().count();
        if candidate_len == 0 {
            continue;
        }
        let original_len = originals[index].chars().count().max(1);
        let drift = (candidate_len as f64 - original_len as f64).abs() / original_len as f64;
        if drift > config.length_tolerance {
            mapping[index] = None;
        }
    }
}
