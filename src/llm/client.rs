use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Oracle;
use crate::error::OracleError;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Which hosted completion API to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenRouter,
    Anthropic,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "google/gemini-2.5-flash-lite",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::Anthropic => "Anthropic",
        }
    }
}

/// Configuration for the hosted oracle clients
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: Provider,
    pub api_key: String,
    /// Model identifier understood by the provider
    pub model: String,
    /// Temperature (0 keeps corrections deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl OracleConfig {
    /// Create config from environment variables
    pub fn from_env(provider: Provider) -> Result<Self, OracleError> {
        let api_key =
            std::env::var(provider.env_var()).map_err(|_| OracleError::MissingApiKey {
                provider: provider.display_name().to_string(),
                env_var: provider.env_var().to_string(),
            })?;

        Ok(Self::new(provider, api_key))
    }

    /// Create with the provider's default model
    pub fn new(provider: Provider, api_key: String) -> Self {
        Self {
            provider,
            api_key,
            model: provider.default_model().to_string(),
            temperature: 0.0,
            max_tokens: 8192,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Build the concrete client for a config
pub fn build_oracle(config: OracleConfig) -> Result<Box<dyn Oracle>, OracleError> {
    match config.provider {
        Provider::OpenRouter => Ok(Box::new(OpenRouterClient::new(config)?)),
        Provider::Anthropic => Ok(Box::new(AnthropicClient::new(config)?)),
    }
}

fn http_client(config: &OracleConfig) -> Result<Client, OracleError> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| OracleError::Request {
            provider: config.provider.display_name().to_string(),
            message: e.to_string(),
        })
}

/// OpenRouter client speaking the OpenAI chat completions protocol
pub struct OpenRouterClient {
    client: Client,
    config: OracleConfig,
    name: String,
}

impl OpenRouterClient {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            client: http_client(&config)?,
            name: format!("openrouter:{}", config.model),
            config,
        })
    }
}

#[async_trait]
impl Oracle for OpenRouterClient {
    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, OracleError> {
        let provider = "OpenRouter";
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_content.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(OracleError::Api {
                provider: provider.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let response: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| OracleError::MalformedResponse {
                    provider: provider.to_string(),
                    message: e.to_string(),
                })?;

        response.into_text()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Anthropic messages API client
pub struct AnthropicClient {
    client: Client,
    config: OracleConfig,
    name: String,
}

impl AnthropicClient {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            client: http_client(&config)?,
            name: format!("anthropic:{}", config.model),
            config,
        })
    }
}

#[async_trait]
impl Oracle for AnthropicClient {
    async fn invoke(&self, system_prompt: &str, user_content: &str) -> Result<String, OracleError> {
        let provider = "Anthropic";
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system_prompt.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user_content.to_string(),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(provider, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                provider: provider.to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let response: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| OracleError::MalformedResponse {
                    provider: provider.to_string(),
                    message: e.to_string(),
                })?;

        response.into_text()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn request_error(provider: &str, error: reqwest::Error) -> OracleError {
    let message = if error.is_timeout() {
        format!("request timed out: {}", error)
    } else {
        error.to_string()
    };
    OracleError::Request {
        provider: provider.to_string(),
        message,
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    /// First choice's content, returned as-is; blank text is a valid answer
    fn into_text(self) -> Result<String, OracleError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(OracleError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

impl AnthropicResponse {
    /// Concatenated text blocks; thinking or tool blocks are ignored
    fn into_text(self) -> Result<String, OracleError> {
        let mut blocks = self
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .peekable();
        if blocks.peek().is_none() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(blocks.map(|c| c.text).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_per_provider() {
        let config = OracleConfig::new(Provider::OpenRouter, "key".to_string());
        assert_eq!(config.model, "google/gemini-2.5-flash-lite");
        assert_eq!(config.temperature, 0.0);

        let config = OracleConfig::new(Provider::Anthropic, "key".to_string()).with_model("m");
        assert_eq!(config.model, "m");
        assert_eq!(Provider::Anthropic.env_var(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_client_names() {
        let client =
            OpenRouterClient::new(OracleConfig::new(Provider::OpenRouter, "k".to_string()))
                .unwrap();
        assert_eq!(client.name(), "openrouter:google/gemini-2.5-flash-lite");
    }

    #[test]
    fn test_parse_chat_completion() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "fixed line"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("fixed line")
        );
    }

    #[test]
    fn test_parse_anthropic_response() {
        let json = r#"{"content": [{"type": "text", "text": "a\nb"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content[0].text, "a\nb");
    }

    #[test]
    fn test_blank_completion_is_returned() {
        let json = r#"{"choices": [{"message": {"content": "\n"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), "\n");

        let json = r#"{"content": [{"type": "thinking"}, {"type": "text", "text": " \n"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), " \n");
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let json = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_text(), Err(OracleError::EmptyResponse)));

        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.into_text(), Err(OracleError::EmptyResponse)));

        let json = r#"{"content": [{"type": "tool_use"}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_text(), Err(OracleError::EmptyResponse)));
    }
}
