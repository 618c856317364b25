pub mod config;
pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod progress;
pub mod refiner;
pub mod stages;

pub use config::{AlignmentStrategy, RefineConfig};
pub use error::{OracleError, RefineError};
pub use heuristics::SimilarityConfig;
pub use io::{
    HumanTranscript, RefineMetadata, RefinedTranscript, RefinementSummary, TranscriptInput,
    parse_video_file, parse_video_json, read_raw_buffer,
};
pub use llm::{EchoOracle, Oracle, OracleConfig, Provider, build_oracle};
pub use models::{ChunkPlan, ChunkRange, RealignmentReport, Segment, VideoContext};
pub use progress::{LogProgress, ProgressReporter};
pub use refiner::{RefineOutcome, Refiner};
pub use stages::{OutputPaths, execute_stage0, execute_stage3};
