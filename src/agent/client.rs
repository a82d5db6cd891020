//! Chat-completion client.
//!
//! Sends the rendered prompt to an OpenAI-compatible `/chat/completions`
//! endpoint in a single request and returns the text plus token usage.
//! Failures are reported once; nothing is retried.

use crate::error::AuditError;
use crate::models::{Completion, CompletionRequest, TokenUsage};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the chat client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub model_name: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: 600,
        }
    }
}

/// Anything that can turn a prompt into a completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AuditError>;

    fn model_name(&self) -> &str;
}

/// Message in the chat request.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completion API request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat-completion API response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
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

/// Client for OpenAI-compatible chat-completion services.
pub struct OpenAiChatClient {
    config: ClientConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiChatClient {
    /// Create a client. The key is passed in, never read from the environment here.
    pub fn new(config: ClientConfig, api_key: String) -> Result<Self, AuditError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(AuditError::Config(format!(
                "model base URL must start with 'http://' or 'https://': {}",
                config.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AuditError::Config(format!("failed to create HTTP client: {}", e)))?;

        info!(
            "Initialized chat client for model {} at {}",
            config.model_name, config.base_url
        );

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model_name.clone(),
            messages: build_messages(request),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AuditError> {
        let url = self.endpoint();
        let body = self.build_request(request);

        debug!(
            "Sending chat request to {} ({} messages, {} prompt bytes)",
            url,
            body.messages.len(),
            request.user.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuditError::Service(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    AuditError::Service(format!(
                        "cannot connect to model service at {}",
                        self.config.base_url
                    ))
                } else {
                    AuditError::Service(format!("failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuditError::Service(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        parse_completion(&text)
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(ref system) = request.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: request.user.clone(),
    });
    messages
}

/// Map a non-success HTTP status to an error.
fn classify_failure(status: StatusCode, body: &str) -> AuditError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuditError::Authentication {
            status: status.as_u16(),
            message,
        },
        _ => AuditError::Service(format!("API error {}: {}", status, message)),
    }
}

/// Pull `error.message` out of an OpenAI-style error body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_completion(body: &str) -> Result<Completion, AuditError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AuditError::Service(format!("failed to parse response: {}", e)))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AuditError::Service("response contained no message content".to_string()))?;

    Ok(Completion {
        text,
        usage: response.usage.unwrap_or_default(),
    })
}
