use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RefineError, Result};
use crate::heuristics::SimilarityConfig;
use crate::llm::DEFAULT_SYSTEM_PROMPT;

/// Default number of segments sent to the oracle per request
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 100;

/// Default line inserted between chunk outputs in the response buffer
pub const DEFAULT_SENTINEL: &str = "<<<__CHUNK_END__>>>";

/// Default bound on a single oracle call
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(120);

/// How a chunk whose oracle output has the wrong number of lines is mapped
/// back onto its segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Pair lines by position, keep original text past the end, drop surplus
    #[default]
    Positional,
    /// Match lines to segments by text similarity
    Similarity,
}

/// Configuration for a refinement run
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Maximum number of segments per oracle request
    pub max_chunk_size: usize,
    /// Chunk boundary line in the response buffer
    pub sentinel: String,
    /// System prompt sent with every chunk; `{line_count}` is replaced with
    /// the chunk's segment count
    pub system_prompt_template: String,
    /// Mismatch recovery policy
    pub alignment: AlignmentStrategy,
    /// Tuning for [`AlignmentStrategy::Similarity`]
    pub similarity: SimilarityConfig,
    /// Bound on each oracle call; expiry fails the run
    pub oracle_timeout: Duration,
    /// Reject runs whose title is blank
    pub require_title: bool,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            sentinel: DEFAULT_SENTINEL.to_string(),
            system_prompt_template: DEFAULT_SYSTEM_PROMPT.to_string(),
            alignment: AlignmentStrategy::default(),
            similarity: SimilarityConfig::default(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            require_title: false,
        }
    }
}

impl RefineConfig {
    /// Check the configuration before any oracle call is made
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(RefineError::Config(
                "max_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.sentinel.trim().is_empty() {
            return Err(RefineError::Config("sentinel must not be blank".to_string()));
        }
        if self.sentinel.contains('\n') || self.sentinel.contains('\r') {
            return Err(RefineError::Config(
                "sentinel must fit on a single line".to_string(),
            ));
        }
        if self.sentinel.starts_with('\\') {
            return Err(RefineError::Config(
                "sentinel must not start with a backslash".to_string(),
            ));
        }
        if self.sentinel.trim() != self.sentinel {
            return Err(RefineError::Config(
                "sentinel must not have leading or trailing whitespace".to_string(),
            ));
        }
        if self.system_prompt_template.trim().is_empty() {
            return Err(RefineError::Config(
                "system prompt template must not be empty".to_string(),
            ));
        }
        if self.oracle_timeout.is_zero() {
            return Err(RefineError::Config(
                "oracle timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// System prompt for a chunk of `line_count` segments
    pub fn system_prompt(&self, line_count: usize) -> String {
        self.system_prompt_template
            .replace("{line_count}", &line_count.to_string())
    }
}
