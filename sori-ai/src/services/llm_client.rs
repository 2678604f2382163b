//! Language Model Client
//!
//! Chat-completion capability used for text affect analysis, coaching and
//! weekly reports. The production client speaks the OpenAI-compatible
//! `POST {base_url}/chat/completions` protocol; the null client stands in when
//! no API key is configured so callers go straight to their fallback.
//!
//! # API Reference
//! - Request: `model`, `temperature`, `max_tokens`, `messages` (system + user)
//! - Reply text: `choices[0].message.content`

use crate::services::http::{build_http_client, endpoint, ensure_success, map_transport_error};
use crate::types::AnalysisFailure;
use crate::utils::{retry_transient, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sori_common::config::LlmConfig;
use std::time::Duration;
use tracing::debug;

/// One system + user exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Chat-completion capability
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Client name for logging
    fn name(&self) -> &'static str;

    /// Whether requests can be attempted at all
    fn is_available(&self) -> bool {
        true
    }

    /// Send one request and return the reply text
    ///
    /// # Errors
    /// Any `AnalysisFailure`; callers answer it with their fallback
    async fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisFailure>;
}

/// Client used when no language model is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLanguageModel;

#[async_trait]
impl LanguageModelClient for NullLanguageModel {
    fn name(&self) -> &'static str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<String, AnalysisFailure> {
        Err(AnalysisFailure::Unavailable(
            "No language model configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat client
pub struct OpenAiChatClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiChatClient {
    pub fn new(
        config: &LlmConfig,
        api_key: String,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: build_http_client(Duration::from_secs(config.timeout_secs))?,
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            retry,
        })
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, AnalysisFailure> {
        let body = CompletionBody {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response = self
            .http_client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = ensure_success(response).await?;
        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisFailure::Schema(format!("Invalid completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalysisFailure::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModelClient for OpenAiChatClient {
    fn name(&self) -> &'static str {
        "openai-chat"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AnalysisFailure> {
        debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            "Sending chat completion request"
        );
        retry_transient("chat completion", &self.retry, || self.send_once(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_client_is_unavailable() {
        let client = NullLanguageModel;
        assert!(!client.is_available());
        let result = client.complete(&ChatRequest::new("sys", "user")).await;
        assert!(matches!(result, Err(AnalysisFailure::Unavailable(_))));
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("sys", "user")
            .with_temperature(0.4)
            .with_max_tokens(700);
        assert_eq!(request.temperature, 0.4);
        assert_eq!(request.max_tokens, 700);
    }

    #[test]
    fn test_completion_body_shape() {
        let body = CompletionBody {
            model: "gpt-4o",
            temperature: 0.3,
            max_tokens: 500,
            messages: [
                Message { role: "system", content: "s" },
                Message { role: "user", content: "u" },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
    }

    #[test]
    fn test_completion_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_failure() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let client =
            OpenAiChatClient::new(&config, "test-key".into(), RetryPolicy::no_retry()).unwrap();
        let result = client.complete(&ChatRequest::new("s", "u")).await;
        assert!(matches!(
            result,
            Err(AnalysisFailure::Network(_)) | Err(AnalysisFailure::Timeout)
        ));
    }
}
