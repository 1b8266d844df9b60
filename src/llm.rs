//! Text-generation providers used by the script classifier.
//!
//! All providers are reached through a chat-style endpoint that takes a
//! system message, a user message, an output ceiling and a temperature, and
//! returns one generated text.
//!
//! # Supported Providers
//!
//! | Provider | Endpoint | Authentication |
//! |----------|----------|----------------|
//! | Groq | `api.groq.com/openai/v1/chat/completions` | Bearer token |
//! | OpenAI | `api.openai.com/v1/chat/completions` | Bearer token |
//! | Anthropic | `api.anthropic.com/v1/messages` | x-api-key header |
//! | Ollama | Local `/api/chat` (configurable) | None |
//!
//! Requests are sent once. There is no retry or backoff.
//!
//! # Example
//!
//! ```
//! use sql_lineage_analyzer::{
//!     llm::{LlmClient, LlmProvider},
//!     repo::Credential
//! };
//!
//! let provider = LlmProvider::Groq {
//!     api_key:  Credential::new("gsk-..."),
//!     model:    "llama-3.1-8b-instant".into(),
//!     base_url: "https://api.groq.com/openai/v1".into()
//! };
//!
//! let client = LlmClient::new(provider);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{GenerationError, describe_http_error},
    repo::Credential
};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One generation call: fixed persona, instruction + script, sampling limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system:      String,
    pub prompt:      String,
    pub max_tokens:  u32,
    pub temperature: f32
}

/// Anything that can turn a [`GenerationRequest`] into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// LLM provider configuration with authentication credentials.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Groq OpenAI-compatible API
    Groq {
        api_key:  Credential,
        model:    String,
        base_url: String
    },
    /// OpenAI API
    OpenAI {
        api_key:  Credential,
        model:    String,
        base_url: String
    },
    /// Anthropic messages API
    Anthropic {
        api_key:  Credential,
        model:    String,
        base_url: String
    },
    /// Local Ollama instance
    Ollama {
        /// Base URL (e.g., "http://localhost:11434")
        base_url: String,
        model:    String
    }
}

impl LlmProvider {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Groq { .. } => "Groq",
            Self::OpenAI { .. } => "OpenAI",
            Self::Anthropic { .. } => "Anthropic",
            Self::Ollama { .. } => "Ollama"
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Groq { model, .. }
            | Self::OpenAI { model, .. }
            | Self::Anthropic { model, .. }
            | Self::Ollama { model, .. } => model
        }
    }
}

/// HTTP client for the configured provider.
pub struct LlmClient {
    provider: LlmProvider,
    client:   reqwest::Client
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role:    &'a str,
    content: &'a str
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model:       &'a str,
    messages:    Vec<ChatMessage<'a>>,
    max_tokens:  u32,
    temperature: f32,
    n:           u32
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model:       &'a str,
    system:      &'a str,
    max_tokens:  u32,
    temperature: f32,
    messages:    Vec<ChatMessage<'a>>
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model:    &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream:   bool,
    options:  OllamaOptions
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: ChatResponseMessage
}

impl LlmClient {
    /// Create a client with the default request timeout
    pub fn new(provider: LlmProvider) -> Self {
        Self::with_timeout(provider, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(provider: LlmProvider, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            provider,
            client
        }
    }

    async fn check(&self, response: Response) -> Result<Response, GenerationError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GenerationError::Api {
            provider: self.provider.label(),
            status,
            body
        })
    }

    fn decode_error(&self, err: reqwest::Error) -> GenerationError {
        GenerationError::Decode {
            provider: self.provider.label(),
            message:  err.to_string()
        }
    }

    async fn call_chat_completions(
        &self,
        api_key: &Credential,
        model: &str,
        base_url: &str,
        request: &GenerationRequest
    ) -> Result<String, GenerationError> {
        let body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role:    "system",
                    content: &request.system
                },
                ChatMessage {
                    role:    "user",
                    content: &request.prompt
                }
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            n: 1
        };
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(describe_http_error(&e)))?;
        let response = self.check(response).await?;
        let result: ChatCompletionResponse =
            response.json().await.map_err(|e| self.decode_error(e))?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyResponse(self.provider.label()))
    }

    async fn call_anthropic(
        &self,
        api_key: &Credential,
        model: &str,
        base_url: &str,
        request: &GenerationRequest
    ) -> Result<String, GenerationError> {
        let body = AnthropicRequest {
            model,
            system: &request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role:    "user",
                content: &request.prompt
            }]
        };
        let url = format!("{}/messages", base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose())
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(describe_http_error(&e)))?;
        let response = self.check(response).await?;
        let result: AnthropicResponse = response.json().await.map_err(|e| self.decode_error(e))?;
        result
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or(GenerationError::EmptyResponse("Anthropic"))
    }

    async fn call_ollama(
        &self,
        base_url: &str,
        model: &str,
        request: &GenerationRequest
    ) -> Result<String, GenerationError> {
        let body = OllamaRequest {
            model,
            messages: vec![
                ChatMessage {
                    role:    "system",
                    content: &request.system
                },
                ChatMessage {
                    role:    "user",
                    content: &request.prompt
                }
            ],
            stream: false,
            options: OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature
            }
        };
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(describe_http_error(&e)))?;
        let response = self.check(response).await?;
        let result: OllamaResponse = response.json().await.map_err(|e| self.decode_error(e))?;
        result
            .message
            .content
            .ok_or(GenerationError::EmptyResponse("Ollama"))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(
            provider = self.provider.label(),
            model = self.provider.model(),
            max_tokens = request.max_tokens,
            "sending generation request"
        );
        match &self.provider {
            LlmProvider::Groq {
                api_key,
                model,
                base_url
            }
            | LlmProvider::OpenAI {
                api_key,
                model,
                base_url
            } => {
                self.call_chat_completions(api_key, model, base_url, request)
                    .await
            }
            LlmProvider::Anthropic {
                api_key,
                model,
                base_url
            } => self.call_anthropic(api_key, model, base_url, request).await,
            LlmProvider::Ollama {
                base_url,
                model
            } => self.call_ollama(base_url, model, request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groq() -> LlmProvider {
        LlmProvider::Groq {
            api_key:  Credential::new("gsk-secret"),
            model:    "llama-3.1-8b-instant".to_string(),
            base_url: "http://localhost:1".to_string()
        }
    }

    #[test]
    fn test_provider_label_and_model() {
        let provider = groq();
        assert_eq!(provider.label(), "Groq");
        assert_eq!(provider.model(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_provider_debug_hides_key() {
        let debug = format!("{:?}", groq());
        assert!(!debug.contains("gsk-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatCompletionRequest {
            model:       "m",
            messages:    vec![ChatMessage {
                role:    "user",
                content: "hi"
            }],
            max_tokens:  150,
            temperature: 0.5,
            n:           1
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["n"], 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = LlmClient::with_timeout(groq(), Duration::from_secs(2));
        let request = GenerationRequest {
            system:      "s".to_string(),
            prompt:      "p".to_string(),
            max_tokens:  10,
            temperature: 0.0
        };
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }
}
