use tracing::info;

use crate::config::RefineConfig;
use crate::error::{RefineError, Result};
use crate::llm::{LineCountCheck, Oracle};
use crate::models::{ChunkPlan, RealignmentReport, Segment, VideoContext, validate_segments};
use crate::progress::ProgressReporter;
use crate::stages::{Stage2Config, execute_stage0, execute_stage1, execute_stage2};

/// Everything a successful run produces
#[derive(Debug)]
pub struct RefineOutcome {
    /// Refined sequence, same length and timing as the input
    pub segments: Vec<Segment>,
    pub report: RealignmentReport,
    pub plan: ChunkPlan,
    /// Sentinel-joined oracle output for every chunk
    pub raw_buffer: String,
    pub line_checks: Vec<LineCountCheck>,
}

/// Runs the plan, oracle and realignment stages over one transcript
#[derive(Debug, Clone)]
pub struct Refiner {
    config: RefineConfig,
}

impl Refiner {
    /// Build a refiner; the configuration is checked here, before any oracle call
    pub fn new(config: RefineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    fn stage2_config(&self) -> Stage2Config {
        Stage2Config {
            alignment: self.config.alignment,
            similarity: self.config.similarity.clone(),
        }
    }

    /// Refine the text of `segments` through `oracle`
    ///
    /// Chunks are sent one at a time and `progress` is told after each one.
    /// An empty input returns immediately without contacting the oracle.
    pub async fn refine<O, P>(
        &self,
        oracle: &O,
        segments: &[Segment],
        context: &VideoContext,
        progress: &mut P,
    ) -> Result<RefineOutcome>
    where
        O: Oracle + ?Sized,
        P: ProgressReporter + ?Sized,
    {
        validate_segments(segments)?;
        if self.config.require_title && context.title.trim().is_empty() {
            return Err(RefineError::Config(
                "a video title is required but none was given".to_string(),
            ));
        }

        let plan = execute_stage0(segments, self.config.max_chunk_size)?;
        if plan.is_empty() {
            info!("No segments to refine");
            return Ok(RefineOutcome {
                segments: Vec::new(),
                report: RealignmentReport::default(),
                plan,
                raw_buffer: String::new(),
                line_checks: Vec::new(),
            });
        }

        let stage1 =
            execute_stage1(oracle, segments, context, &plan, &self.config, progress).await?;
        let raw_buffer = stage1.buffer.into_text();

        let stage2 = execute_stage2(
            &raw_buffer,
            &self.config.sentinel,
            segments,
            &plan,
            &self.stage2_config(),
        )?;

        Ok(RefineOutcome {
            segments: stage2.segments,
            report: stage2.report,
            plan,
            raw_buffer,
            line_checks: stage1.line_checks,
        })
    }

    /// Realign a previously saved raw buffer without calling the oracle
    pub fn realign_raw(
        &self,
        raw_buffer: &str,
        segments: &[Segment],
    ) -> Result<(Vec<Segment>, RealignmentReport)> {
        validate_segments(segments)?;
        let plan = execute_stage0(segments, self.config.max_chunk_size)?;
        let stage2 = execute_stage2(
            raw_buffer,
            &self.config.sentinel,
            segments,
            &plan,
            &self.stage2_config(),
        )?;
        Ok((stage2.segments, stage2.report))
    }
}
