use async_trait::async_trait;

use crate::error::OracleError;

/// External text-transformation service that rewrites a transcript chunk
///
/// Retries belong to the implementation; the pipeline treats any error as
/// fatal to the run.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send the system prompt and user content, return the raw completion text
    async fn invoke(&self, system_prompt: &str, user_content: &str)
    -> Result<String, OracleError>;

    /// Name used in logs and output metadata
    fn name(&self) -> &str;
}
