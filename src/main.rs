use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use recaption::config::DEFAULT_SENTINEL;
use recaption::{
    AlignmentStrategy, EchoOracle, LogProgress, Oracle, OracleConfig, OutputPaths, Provider,
    RealignmentReport, RefineConfig, RefineMetadata, RefinedTranscript, RefinementSummary,
    Refiner, Segment, TranscriptInput, VideoContext, build_oracle, execute_stage0, execute_stage3,
    parse_video_file, read_raw_buffer,
};

#[derive(Parser)]
#[command(name = "recaption")]
#[command(author, version, about = "Transcript caption refinement pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OracleArg {
    Openrouter,
    Anthropic,
    /// Return every chunk unchanged, no network access
    Echo,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlignmentArg {
    Positional,
    Similarity,
}

impl From<AlignmentArg> for AlignmentStrategy {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::Positional => AlignmentStrategy::Positional,
            AlignmentArg::Similarity => AlignmentStrategy::Similarity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Correct caption text through an LLM while keeping every timestamp
    Refine {
        /// Input transcript file (video JSON with a transcript array)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for machine-readable transcript (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for human-readable transcript (text)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Output file for the raw sentinel-joined oracle responses
        #[arg(long)]
        raw_output: Option<PathBuf>,

        /// Oracle backend
        #[arg(long, value_enum, default_value = "openrouter")]
        provider: OracleArg,

        /// Model identifier (defaults to the provider's default)
        #[arg(long)]
        model: Option<String>,

        /// Maximum segments per oracle request
        #[arg(long, default_value = "100")]
        max_chunk_size: usize,

        /// Recovery policy for chunks with the wrong line count
        #[arg(long, value_enum, default_value = "positional")]
        alignment: AlignmentArg,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "120")]
        timeout_secs: u64,

        /// Line written between chunk outputs in the raw buffer
        #[arg(long, default_value = DEFAULT_SENTINEL)]
        sentinel: String,

        /// File holding a replacement system prompt (`{line_count}` is substituted)
        #[arg(long)]
        prompt_file: Option<PathBuf>,

        /// Override the video title from the input file
        #[arg(long)]
        title: Option<String>,

        /// Fail when no video title is available
        #[arg(long)]
        require_title: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how a transcript would be chunked without calling the oracle
    Plan {
        /// Input transcript file
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum segments per oracle request
        #[arg(long, default_value = "100")]
        max_chunk_size: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Realign a saved raw oracle buffer against its input transcript
    Realign {
        /// Input transcript file the buffer was produced from
        #[arg(short, long)]
        input: PathBuf,

        /// Raw buffer written by `refine --raw-output`
        #[arg(long)]
        raw: PathBuf,

        /// Output file for machine-readable transcript (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for human-readable transcript (text)
        #[arg(long)]
        human_readable: Option<PathBuf>,

        /// Chunk size used when the buffer was produced
        #[arg(long, default_value = "100")]
        max_chunk_size: usize,

        /// Sentinel used when the buffer was produced
        #[arg(long, default_value = DEFAULT_SENTINEL)]
        sentinel: String,

        /// Recovery policy for chunks with the wrong line count
        #[arg(long, value_enum, default_value = "positional")]
        alignment: AlignmentArg,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refine {
            input,
            output,
            human_readable,
            raw_output,
            provider,
            model,
            max_chunk_size,
            alignment,
            timeout_secs,
            sentinel,
            prompt_file,
            title,
            require_title,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = RefineConfig {
                max_chunk_size,
                sentinel,
                alignment: alignment.into(),
                oracle_timeout: Duration::from_secs(timeout_secs),
                require_title,
                ..Default::default()
            };
            if let Some(path) = prompt_file {
                config.system_prompt_template = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt file: {:?}", path))?;
            }
            let oracle = make_oracle(provider, model, config.oracle_timeout)?;
            let paths = OutputPaths {
                machine: Some(&output),
                human: human_readable.as_deref(),
                raw: raw_output.as_deref(),
            };
            refine_transcript(&input, title, config, oracle.as_ref(), paths).await
        }
        Commands::Plan {
            input,
            max_chunk_size,
            verbose,
        } => {
            setup_logging(verbose);
            plan_transcript(&input, max_chunk_size)
        }
        Commands::Realign {
            input,
            raw,
            output,
            human_readable,
            max_chunk_size,
            sentinel,
            alignment,
            verbose,
        } => {
            setup_logging(verbose);
            let config = RefineConfig {
                max_chunk_size,
                sentinel,
                alignment: alignment.into(),
                ..Default::default()
            };
            let paths = OutputPaths {
                machine: Some(&output),
                human: human_readable.as_deref(),
                raw: None,
            };
            realign_transcript(&input, &raw, config, paths)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn make_oracle(
    provider: OracleArg,
    model: Option<String>,
    timeout: Duration,
) -> Result<Box<dyn Oracle>> {
    let provider = match provider {
        OracleArg::Echo => return Ok(Box::new(EchoOracle)),
        OracleArg::Openrouter => Provider::OpenRouter,
        OracleArg::Anthropic => Provider::Anthropic,
    };

    let mut config = OracleConfig::from_env(provider)?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    config.request_timeout = timeout;

    info!("Using {} model {}", provider.display_name(), config.model);
    Ok(build_oracle(config)?)
}

fn load_input(input: &Path) -> Result<TranscriptInput> {
    info!("Loading transcript from {:?}", input);
    let transcript = parse_video_file(input).context("Failed to parse input transcript")?;
    info!(
        "Loaded {} segments for {:?}",
        transcript.segments.len(),
        transcript.context.title
    );
    Ok(transcript)
}

async fn refine_transcript(
    input: &Path,
    title: Option<String>,
    config: RefineConfig,
    oracle: &dyn Oracle,
    paths: OutputPaths<'_>,
) -> Result<()> {
    let TranscriptInput {
        mut context,
        segments,
    } = load_input(input)?;
    if let Some(title) = title {
        context.title = title;
    }

    let refiner = Refiner::new(config)?;
    let outcome = refiner
        .refine(oracle, &segments, &context, &mut LogProgress)
        .await?;

    let mismatched = outcome.line_checks.iter().filter(|c| !c.is_match()).count();
    if mismatched > 0 {
        warn!(
            "{} of {} chunks returned the wrong number of lines",
            mismatched,
            outcome.plan.total_chunks()
        );
    }

    write_outputs(
        &context,
        &segments,
        &outcome.segments,
        outcome.report,
        oracle.name(),
        outcome.plan.total_chunks(),
        &outcome.raw_buffer,
        paths,
    )
}

fn plan_transcript(input: &Path, max_chunk_size: usize) -> Result<()> {
    let transcript = load_input(input)?;
    let plan = execute_stage0(&transcript.segments, max_chunk_size)?;

    println!("Chunk Plan");
    println!("==========");
    println!("Segments: {}", plan.segment_count);
    println!("Max chunk size: {}", max_chunk_size);
    println!("Chunks: {}", plan.total_chunks());
    println!();

    for (index, range) in plan.iter() {
        let chunk = range.slice(&transcript.segments);
        let (first, last) = match (chunk.first(), chunk.last()) {
            (Some(first), Some(last)) => (first.start_ms, last.end_ms),
            _ => (0, 0),
        };
        println!(
            "Chunk {}: segments {}..{} ({} lines, {:.1}s to {:.1}s)",
            index + 1,
            range.start_index,
            range.end_index,
            range.len(),
            first as f64 / 1000.0,
            last as f64 / 1000.0
        );
    }

    Ok(())
}

fn realign_transcript(
    input: &Path,
    raw: &Path,
    config: RefineConfig,
    paths: OutputPaths<'_>,
) -> Result<()> {
    let TranscriptInput { context, segments } = load_input(input)?;
    let raw_buffer = read_raw_buffer(raw)?;

    let refiner = Refiner::new(config)?;
    let (refined, report) = refiner.realign_raw(&raw_buffer, &segments)?;
    let total_chunks = execute_stage0(&segments, refiner.config().max_chunk_size)?.total_chunks();

    write_outputs(
        &context,
        &segments,
        &refined,
        report,
        "raw-buffer",
        total_chunks,
        &raw_buffer,
        paths,
    )
}

#[allow(clippy::too_many_arguments)]
fn write_outputs(
    context: &VideoContext,
    original: &[Segment],
    refined: &[Segment],
    report: RealignmentReport,
    oracle_name: &str,
    total_chunks: usize,
    raw_buffer: &str,
    paths: OutputPaths<'_>,
) -> Result<()> {
    let summary = RefinementSummary::compare(original, refined);
    let metadata = RefineMetadata {
        run_id: Uuid::new_v4().to_string(),
        refined_at: Utc::now(),
        oracle: oracle_name.to_string(),
        total_segments: refined.len(),
        total_chunks,
        segments_changed: summary.segments_changed,
        segments_kept_original: report.segments_kept_original,
    };
    let transcript =
        RefinedTranscript::from_segments(context, original, refined, report.mismatches, metadata);

    info!("Stage 3: Rendering output...");
    let result = execute_stage3(&transcript, refined, raw_buffer, paths)?;

    info!("Output written to {:?}", result.machine_path);
    if let Some(human_path) = result.human_path {
        info!("Human-readable output written to {:?}", human_path);
    }
    if let Some(raw_path) = result.raw_path {
        info!("Raw oracle buffer written to {:?}", raw_path);
    }

    info!(
        "Complete: {}/{} segments returned, {} timestamps preserved, {} changed (avg {:+.1} chars, max {})",
        summary.segments_received,
        summary.segments_sent,
        summary.timestamps_preserved,
        summary.segments_changed,
        summary.avg_length_change,
        summary.max_length_change
    );
    if !summary.is_complete() {
        warn!("Refined transcript does not line up with its input");
    }

    Ok(())
}
