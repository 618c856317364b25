//! Local oracles for dry runs and tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Oracle, extract_chunk_text};
use crate::error::OracleError;

/// Returns the chunk text of each request unchanged
#[derive(Debug, Default)]
pub struct EchoOracle;

#[async_trait]
impl Oracle for EchoOracle {
    async fn invoke(
        &self,
        _system_prompt: &str,
        user_content: &str,
    ) -> Result<String, OracleError> {
        extract_chunk_text(user_content)
            .map(str::to_string)
            .ok_or_else(|| OracleError::MalformedResponse {
                provider: "echo".to_string(),
                message: "request has no transcript chunk".to_string(),
            })
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// One queued behaviour of a [`ScriptedOracle`]
#[derive(Debug)]
pub enum ScriptedReply {
    Text(String),
    Fail(OracleError),
    /// Sleep before answering, for exercising timeouts
    Delayed(Duration, String),
    /// Answer with the request's own chunk text
    Echo,
}

/// Oracle that plays back queued replies and records every request
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Convenience constructor for plain text replies
    pub fn with_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    /// Number of calls to invoke()
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Recorded `(system_prompt, user_content)` pairs in call order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Highest number of overlapping invocations observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, OracleError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Ok(mut requests) = self.requests.lock() {
            requests.push((system_prompt.to_string(), user_content.to_string()));
        }
        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        let result = match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(error)) => Err(error),
            Some(ScriptedReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(ScriptedReply::Echo) => EchoOracle.invoke(system_prompt, user_content).await,
            None => Err(OracleError::EmptyResponse),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
