use std::time::Duration;

use thiserror::Error;

/// Failures raised by an oracle adapter
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("API key not found for {provider}. Set the {env_var} environment variable.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Request to {provider} failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("Oracle returned no text content")]
    EmptyResponse,

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures of a refinement run
///
/// A run either produces a complete refined sequence or one of these.
/// Line-count mismatches are never errors; they surface as diagnostics.
#[derive(Error, Debug)]
pub enum RefineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid segment at index {index}: {reason}")]
    InvalidSegment { index: usize, reason: String },

    #[error("Oracle failed on chunk {chunk_number} of {total_chunks}: {source}")]
    Oracle {
        /// 1-based position of the failing chunk
        chunk_number: usize,
        total_chunks: usize,
        #[source]
        source: OracleError,
    },

    #[error(
        "Sentinel boundary mismatch: expected {expected} chunk groups, found {found}"
    )]
    SentinelMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, RefineError>;
