use tracing::{info, warn};

use crate::config::AlignmentStrategy;
use crate::error::{RefineError, Result};
use crate::heuristics::{SimilarityConfig, align_chunk};
use crate::llm::output_lines;
use crate::models::{
    ChunkPlan, LineCountMismatch, MismatchResolution, RealignmentReport, Segment,
    split_sentinel_groups,
};

/// Configuration for Stage 2
#[derive(Debug, Clone, Default)]
pub struct Stage2Config {
    pub alignment: AlignmentStrategy,
    pub similarity: SimilarityConfig,
}

/// Result of Stage 2 realignment
#[derive(Debug)]
pub struct Stage2Result {
    /// Refined sequence, same length and timing as the input
    pub segments: Vec<Segment>,
    pub report: RealignmentReport,
}

/// Execute Stage 2: realign a sentinel-joined oracle buffer
///
/// The buffer must split into exactly one group per planned chunk; any
/// other count means output cannot be attributed to chunks and the run
/// fails.
pub fn execute_stage2(
    buffer: &str,
    sentinel: &str,
    segments: &[Segment],
    plan: &ChunkPlan,
    config: &Stage2Config,
) -> Result<Stage2Result> {
    let groups = split_sentinel_groups(buffer, sentinel);
    realign(&groups, segments, plan, config)
}

/// Map per-chunk oracle outputs back onto the original segments
pub fn realign<S: AsRef<str>>(
    outputs: &[S],
    segments: &[Segment],
    plan: &ChunkPlan,
    config: &Stage2Config,
) -> Result<Stage2Result> {
    if outputs.len() != plan.total_chunks() {
        return Err(RefineError::SentinelMismatch {
            expected: plan.total_chunks(),
            found: outputs.len(),
        });
    }

    let mut refined = Vec::with_capacity(segments.len());
    let mut report = RealignmentReport::default();

    for ((index, range), output) in plan.iter().zip(outputs) {
        let (chunk_segments, chunk_report) =
            realign_chunk(index, output.as_ref(), range.slice(segments), config);
        refined.extend(chunk_segments);
        report.merge(chunk_report);
    }

    info!(
        "Stage 2: {} segments realigned, {} mismatched chunks, {} kept original text",
        refined.len(),
        report.mismatch_count(),
        report.segments_kept_original
    );

    Ok(Stage2Result {
        segments: refined,
        report,
    })
}

/// Realign one chunk's raw oracle output onto its segments
///
/// Always yields exactly `originals.len()` segments with untouched timing.
pub fn realign_chunk(
    chunk_index: usize,
    raw_output: &str,
    originals: &[Segment],
    config: &Stage2Config,
) -> (Vec<Segment>, RealignmentReport) {
    let expected = originals.len();
    let lines = output_lines(raw_output, expected);
    let mut report = RealignmentReport::default();

    let mapping: Vec<Option<usize>> = if lines.len() == expected {
        (0..expected).map(Some).collect()
    } else {
        let resolution = match config.alignment {
            AlignmentStrategy::Similarity => MismatchResolution::SimilarityAligned,
            AlignmentStrategy::Positional if lines.len() < expected => {
                MismatchResolution::FilledFromOriginal
            }
            AlignmentStrategy::Positional => MismatchResolution::SurplusDiscarded,
        };
        warn!(
            "Chunk {}: expected {} lines, got {} ({:?})",
            chunk_index + 1,
            expected,
            lines.len(),
            resolution
        );
        report.mismatches.push(LineCountMismatch {
            chunk_index,
            expected,
            actual: lines.len(),
            resolution,
        });

        match config.alignment {
            AlignmentStrategy::Positional => (0..expected)
                .map(|i| (i < lines.len()).then_some(i))
                .collect(),
            AlignmentStrategy::Similarity => {
                let original_texts: Vec<&str> =
                    originals.iter().map(|s| s.text.as_str()).collect();
                let line_texts: Vec<&str> = lines.iter().map(String::as_str).collect();
                align_chunk(&original_texts, &line_texts, &config.similarity)
            }
        }
    };

    let used_lines = mapping.iter().flatten().count();
    report.lines_discarded = lines.len() - used_lines;

    let refined = originals
        .iter()
        .zip(&mapping)
        .map(|(original, line_index)| match line_index.map(|i| lines[i].as_str()) {
            Some(line) if !line.is_empty() => original.with_text(line),
            Some(_) if !original.text.trim().is_empty() => {
                report.blank_line_fallbacks += 1;
                original.clone()
            }
            Some(line) => original.with_text(line),
            None => {
                report.segments_kept_original += 1;
                original.clone()
            }
        })
        .collect();

    (refined, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{execute_stage0, linearize};

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(*t, i as u64 * 2_000, i as u64 * 2_000 + 1_500))
            .collect()
    }

    fn assert_timing_preserved(input: &[Segment], output: &[Segment]) {
        assert_eq!(input.len(), output.len());
        for (a, b) in input.iter().zip(output) {
            assert_eq!(a.start_ms, b.start_ms);
            assert_eq!(a.end_ms, b.end_ms);
            assert_eq!(a.start_time_text, b.start_time_text);
        }
    }

    #[test]
    fn test_exact_match_pairs_positionally() {
        let originals = segments(&["helo", "wrld"]);
        let (refined, report) =
            realign_chunk(0, "hello\nworld\n", &originals, &Stage2Config::default());

        assert_eq!(refined[0].text, "hello");
        assert_eq!(refined[1].text, "world");
        assert!(!report.has_mismatches());
        assert_timing_preserved(&originals, &refined);
    }

    #[test]
    fn test_short_output_falls_back_to_original() {
        let originals = segments(&["s0", "s1", "s2", "s3", "s4"]);
        let (refined, report) =
            realign_chunk(3, "r0\nr1\nr2", &originals, &Stage2Config::default());

        let texts: Vec<&str> = refined.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["r0", "r1", "r2", "s3", "s4"]);
        assert_eq!(
            report.mismatches,
            vec![LineCountMismatch {
                chunk_index: 3,
                expected: 5,
                actual: 3,
                resolution: MismatchResolution::FilledFromOriginal,
            }]
        );
        assert_eq!(report.segments_kept_original, 2);
        assert_timing_preserved(&originals, &refined);
    }

    #[test]
    fn test_long_output_discards_surplus() {
        let originals = segments(&["a", "b"]);
        let (refined, report) =
            realign_chunk(0, "A\nB\nC\nD", &originals, &Stage2Config::default());

        assert_eq!(refined[0].text, "A");
        assert_eq!(refined[1].text, "B");
        assert_eq!(report.lines_discarded, 2);
        assert_eq!(
            report.mismatches[0].resolution,
            MismatchResolution::SurplusDiscarded
        );
    }

    #[test]
    fn test_empty_output_keeps_everything() {
        let originals = segments(&["a", "b"]);
        let (refined, report) = realign_chunk(0, "", &originals, &Stage2Config::default());

        assert_eq!(refined, originals);
        assert_eq!(report.mismatch_count(), 1);
        assert_eq!(report.blank_line_fallbacks, 1);
        assert_eq!(report.segments_kept_original, 1);
    }

    #[test]
    fn test_all_blank_reply_is_recorded_mismatch() {
        let originals = segments(&["", "", ""]);
        let (refined, report) = realign_chunk(2, "\n", &originals, &Stage2Config::default());

        assert_eq!(refined, originals);
        assert_eq!(
            report.mismatches,
            vec![LineCountMismatch {
                chunk_index: 2,
                expected: 3,
                actual: 2,
                resolution: MismatchResolution::FilledFromOriginal,
            }]
        );

        let (refined, report) = realign_chunk(0, " \n\n", &originals, &Stage2Config::default());
        assert_eq!(refined, originals);
        assert!(!report.has_mismatches());
    }

    #[test]
    fn test_chunk_ending_in_empty_segment_is_exact() {
        let originals = segments(&["helo wrld this", "x y", ""]);
        let output = "hello world, this is\nx y\n";

        for alignment in [AlignmentStrategy::Positional, AlignmentStrategy::Similarity] {
            let config = Stage2Config {
                alignment,
                ..Default::default()
            };
            let (refined, report) = realign_chunk(0, output, &originals, &config);

            let texts: Vec<&str> = refined.iter().map(|s| s.text.as_str()).collect();
            assert_eq!(texts, vec!["hello world, this is", "x y", ""]);
            assert!(!report.has_mismatches(), "{:?}", alignment);
            assert_timing_preserved(&originals, &refined);
        }
    }

    #[test]
    fn test_blank_line_keeps_original_text() {
        let originals = segments(&["keep me", "", "x"]);
        let (refined, report) = realign_chunk(0, "\n\nX", &originals, &Stage2Config::default());

        assert_eq!(refined[0].text, "keep me");
        assert_eq!(refined[1].text, "");
        assert_eq!(refined[2].text, "X");
        assert_eq!(report.blank_line_fallbacks, 1);
        assert!(!report.has_mismatches());
    }

    #[test]
    fn test_similarity_strategy_recovers_dropped_line() {
        let originals = segments(&[
            "up to 900. From 900 up to 1,100.",
            "If you sold at the reasonable",
            "valuations, when the gains that already",
            "been had, you missed out big time. I",
        ]);
        let output = "up to $900. From $900 up to $1,100.\nvaluations, when the gains that already\nhad been had, you missed out big time. I";
        let mut config = Stage2Config {
            alignment: AlignmentStrategy::Similarity,
            ..Default::default()
        };
        config.similarity.tail_guard_size = 0;

        let (refined, report) = realign_chunk(0, output, &originals, &config);

        assert_eq!(refined[0].text, "up to $900. From $900 up to $1,100.");
        assert_eq!(refined[1].text, "If you sold at the reasonable");
        assert_eq!(refined[2].text, "valuations, when the gains that already");
        assert_eq!(refined[3].text, "had been had, you missed out big time. I");
        assert_eq!(
            report.mismatches[0].resolution,
            MismatchResolution::SimilarityAligned
        );
        assert_eq!(report.segments_kept_original, 1);
        assert_timing_preserved(&originals, &refined);

        // 40 chars against 36 is outside the default 10% tail tolerance
        config.similarity.tail_guard_size = 5;
        let (refined, report) = realign_chunk(0, output, &originals, &config);
        assert_eq!(refined[0].text, "up to $900. From $900 up to $1,100.");
        assert_eq!(refined[3].text, "been had, you missed out big time. I");
        assert_eq!(report.segments_kept_original, 2);
    }

    #[test]
    fn test_echo_buffer_is_idempotent() {
        let input = segments(&["one  two", "three\nfour", "", "five", "six", "seven"]);
        let plan = execute_stage0(&input, 4).unwrap();
        let mut buffer = crate::models::ResponseBuffer::new("<<<__CHUNK_END__>>>");
        for (_, range) in plan.iter() {
            buffer.push_chunk(&linearize(range.slice(&input)));
        }

        let result = execute_stage2(
            buffer.as_str(),
            "<<<__CHUNK_END__>>>",
            &input,
            &plan,
            &Stage2Config::default(),
        )
        .unwrap();

        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "", "five", "six", "seven"]);
        assert!(!result.report.has_mismatches());
        assert_timing_preserved(&input, &result.segments);
    }

    #[test]
    fn test_sentinel_group_mismatch_is_fatal() {
        let input = segments(&["a", "b", "c"]);
        let plan = execute_stage0(&input, 1).unwrap();
        let buffer = "A\n<<<__CHUNK_END__>>>\nB\n<<<__CHUNK_END__>>>\n";

        let err = execute_stage2(
            buffer,
            "<<<__CHUNK_END__>>>",
            &input,
            &plan,
            &Stage2Config::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RefineError::SentinelMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_sentinel_in_input_text_is_not_a_boundary() {
        let input = segments(&[
            "price <<<__CHUNK_END__>>> tag",
            "<<<__CHUNK_END__>>>",
            "end",
        ]);
        let plan = execute_stage0(&input, 10).unwrap();
        let mut buffer = crate::models::ResponseBuffer::new("<<<__CHUNK_END__>>>");
        buffer.push_chunk(&linearize(&input));

        let result = execute_stage2(
            buffer.as_str(),
            "<<<__CHUNK_END__>>>",
            &input,
            &plan,
            &Stage2Config::default(),
        )
        .unwrap();

        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["price <<<__CHUNK_END__>>> tag", "<<<__CHUNK_END__>>>", "end"]
        );
    }

    #[test]
    fn test_empty_plan() {
        let result =
            realign::<&str>(&[], &[], &ChunkPlan::default(), &Stage2Config::default()).unwrap();
        assert!(result.segments.is_empty());
    }
}
