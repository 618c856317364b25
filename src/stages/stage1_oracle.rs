use tracing::{debug, info, warn};

use crate::config::RefineConfig;
use crate::error::{OracleError, RefineError, Result};
use crate::llm::{LineCountCheck, Oracle, build_chunk_prompt, check_line_count};
use crate::models::{ChunkPlan, ResponseBuffer, Segment, VideoContext};
use crate::progress::ProgressReporter;
use crate::stages::linearize;

/// Result of Stage 1 processing
#[derive(Debug)]
pub struct Stage1Result {
    /// Sentinel-delimited oracle output for every chunk, in chunk order
    pub buffer: ResponseBuffer,
    /// Line-count comparison per chunk, in chunk order
    pub line_checks: Vec<LineCountCheck>,
}

impl Stage1Result {
    /// Chunks whose oracle output had the wrong number of lines
    pub fn mismatched_chunks(&self) -> usize {
        self.line_checks.iter().filter(|c| !c.is_match()).count()
    }
}

/// Execute Stage 1: send every chunk to the oracle
///
/// Chunks go out strictly one at a time in ascending order; each call is
/// awaited before the next is built. Any oracle failure or timeout aborts
/// the run and identifies the failing chunk.
pub async fn execute_stage1<O, P>(
    oracle: &O,
    segments: &[Segment],
    context: &VideoContext,
    plan: &ChunkPlan,
    config: &RefineConfig,
    progress: &mut P,
) -> Result<Stage1Result>
where
    O: Oracle + ?Sized,
    P: ProgressReporter + ?Sized,
{
    let total_chunks = plan.total_chunks();
    let mut buffer = ResponseBuffer::new(config.sentinel.clone());
    let mut line_checks = Vec::with_capacity(total_chunks);

    info!(
        "Stage 1: Sending {} chunks to {}",
        total_chunks,
        oracle.name()
    );

    for (index, range) in plan.iter() {
        let chunk = range.slice(segments);
        let chunk_number = index + 1;

        let system_prompt = config.system_prompt(chunk.len());
        let user_content = build_chunk_prompt(context, &linearize(chunk));

        debug!(
            "Chunk {}/{}: dispatching segments {}..{}",
            chunk_number, total_chunks, range.start_index, range.end_index
        );

        let call = oracle.invoke(&system_prompt, &user_content);
        let output = match tokio::time::timeout(config.oracle_timeout, call).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(RefineError::Oracle {
                    chunk_number,
                    total_chunks,
                    source,
                });
            }
            Err(_) => {
                return Err(RefineError::Oracle {
                    chunk_number,
                    total_chunks,
                    source: OracleError::Timeout(config.oracle_timeout),
                });
            }
        };

        let check = check_line_count(&output, chunk.len());
        info!(
            "Chunk {}/{} completed: received {} lines (expected {})",
            chunk_number, total_chunks, check.actual, check.expected
        );
        if !check.is_match() {
            warn!(
                "Line count mismatch in chunk {}: expected {}, got {}",
                chunk_number, check.expected, check.actual
            );
        }

        let escaped_before = buffer.escaped_lines();
        buffer.push_chunk(&output);
        if buffer.escaped_lines() > escaped_before {
            warn!(
                "Chunk {}: escaped {} oracle lines resembling the sentinel",
                chunk_number,
                buffer.escaped_lines() - escaped_before
            );
        }

        line_checks.push(check);
        progress.chunk_completed(chunk_number, total_chunks);
    }

    Ok(Stage1Result {
        buffer,
        line_checks,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::{ScriptedOracle, ScriptedReply};
    use crate::stages::execute_stage0;

    fn segments(count: usize) -> Vec<Segment> {
        (0..count)
            .map(|i| Segment::new(format!("line {}", i), i as u64 * 1_000, i as u64 * 1_000 + 800))
            .collect()
    }

    #[tokio::test]
    async fn test_sequential_dispatch_and_progress() {
        let input = segments(12);
        let config = RefineConfig {
            max_chunk_size: 5,
            ..Default::default()
        };
        let plan = execute_stage0(&input, config.max_chunk_size).unwrap();
        let oracle = ScriptedOracle::new([
            ScriptedReply::Echo,
            ScriptedReply::Echo,
            ScriptedReply::Echo,
        ]);
        let mut seen = Vec::new();
        let mut progress = |done: usize, total: usize| seen.push((done, total));

        let result = execute_stage1(
            &oracle,
            &input,
            &VideoContext::new("Title", "Desc"),
            &plan,
            &config,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(oracle.call_count(), 3);
        assert_eq!(oracle.max_in_flight(), 1);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(result.buffer.chunk_count(), 3);
        assert_eq!(result.mismatched_chunks(), 0);

        let requests = oracle.requests();
        assert!(requests[0].0.contains("exactly 5 lines"));
        assert!(requests[2].0.contains("exactly 2 lines"));
        assert!(requests[1].1.starts_with("Video Title: Title\nVideo Description: Desc\n"));
        assert!(requests[1].1.ends_with("line 5\nline 6\nline 7\nline 8\nline 9"));
    }

    #[tokio::test]
    async fn test_oracle_failure_identifies_chunk() {
        let input = segments(4);
        let config = RefineConfig {
            max_chunk_size: 2,
            ..Default::default()
        };
        let plan = execute_stage0(&input, 2).unwrap();
        let oracle = ScriptedOracle::new([
            ScriptedReply::Echo,
            ScriptedReply::Fail(OracleError::Api {
                provider: "test".to_string(),
                status: 500,
                message: "boom".to_string(),
            }),
        ]);
        let mut calls = 0;
        let mut progress = |_: usize, _: usize| calls += 1;

        let err = execute_stage1(
            &oracle,
            &input,
            &VideoContext::default(),
            &plan,
            &config,
            &mut progress,
        )
        .await
        .unwrap_err();

        match err {
            RefineError::Oracle {
                chunk_number,
                total_chunks,
                source: OracleError::Api { status, .. },
            } => {
                assert_eq!(chunk_number, 2);
                assert_eq!(total_chunks, 2);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_timeout_fails_run() {
        let input = segments(2);
        let config = RefineConfig {
            oracle_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let plan = execute_stage0(&input, config.max_chunk_size).unwrap();
        let oracle = ScriptedOracle::new([ScriptedReply::Delayed(
            Duration::from_secs(30),
            "late".to_string(),
        )]);
        let mut progress = |_: usize, _: usize| {};

        let err = execute_stage1(
            &oracle,
            &input,
            &VideoContext::default(),
            &plan,
            &config,
            &mut progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            RefineError::Oracle {
                chunk_number: 1,
                source: OracleError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_mismatch_is_recorded_not_fatal() {
        let input = segments(3);
        let plan = execute_stage0(&input, 10).unwrap();
        let oracle = ScriptedOracle::with_texts(["only one line"]);
        let mut progress = |_: usize, _: usize| {};

        let result = execute_stage1(
            &oracle,
            &input,
            &VideoContext::default(),
            &plan,
            &RefineConfig::default(),
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(result.mismatched_chunks(), 1);
        assert_eq!(result.line_checks[0].actual, 1);
    }

    #[tokio::test]
    async fn test_blank_reply_for_silent_chunk() {
        let input: Vec<Segment> = (0..2)
            .map(|i| Segment::new("", i * 1_000, i * 1_000 + 500))
            .collect();
        let plan = execute_stage0(&input, 10).unwrap();
        let oracle = ScriptedOracle::with_texts(["\n"]);
        let mut progress = |_: usize, _: usize| {};

        let result = execute_stage1(
            &oracle,
            &input,
            &VideoContext::default(),
            &plan,
            &RefineConfig::default(),
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(result.mismatched_chunks(), 0);
        assert_eq!(result.buffer.chunk_count(), 1);
    }
}
