//! Anthropic Messages API client
//!
//! Async HTTP client for the Messages endpoint with tool use, optional
//! extended thinking, and retry on transient failures.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{AideError, Config, ContentBlock, Message, Result, StopCondition, ToolDefinition};
use crate::llm::traits::{ModelBackend, ModelRequest, ModelResponse};

const API_VERSION: &str = "2023-06-01";
const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 2000;

/// Anthropic Messages API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    /// Thinking budget in tokens (0 = disabled)
    thinking_budget: u32,
    debug: bool,
}

/// Extended thinking configuration
#[derive(Debug, Clone, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    thinking_type: &'static str,
    budget_tokens: u32,
}

/// Messages API request
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

/// Messages API response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicClient {
    /// Create a client from configuration; fails when no API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .backend
            .api_key
            .clone()
            .ok_or(AideError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()
            .map_err(|e| AideError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.backend.endpoint.clone(),
            model: config.backend.model.clone(),
            api_key,
            thinking_budget: config.backend.thinking_budget,
            debug: config.agent.debug,
        })
    }

    /// Get the configured model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Thinking is only sent when the budget fits inside max_tokens
    fn thinking_config(&self, max_tokens: u32) -> Option<ThinkingConfig> {
        if self.thinking_budget >= 1024 && self.thinking_budget < max_tokens {
            Some(ThinkingConfig {
                thinking_type: "enabled",
                budget_tokens: self.thinking_budget,
            })
        } else {
            None
        }
    }

    fn is_retryable(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504 | 529)
    }

    /// Debug print if enabled
    fn debug_print(&self, label: &str, content: &str) {
        if self.debug {
            let shown: String = content.chars().take(500).collect();
            if shown.len() < content.len() {
                log::debug!("{}: {}...", label, shown);
            } else {
                log::debug!("{}: {}", label, shown);
            }
        }
    }

    fn parse_response(body: &str) -> Result<ModelResponse> {
        let response: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| AideError::backend(format!("Failed to parse response: {}", e)))?;

        Ok(ModelResponse {
            content: response.content,
            stop: StopCondition::from_stop_reason(response.stop_reason.as_deref()),
        })
    }
}

#[async_trait]
impl ModelBackend for AnthropicClient {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: Some(request.system.as_str()).filter(|s| !s.is_empty()),
            messages: &request.messages,
            tools: Some(request.tools.as_slice()).filter(|t| !t.is_empty()),
            thinking: self.thinking_config(request.max_tokens),
        };

        if self.debug {
            let request_json = serde_json::to_string(&body)?;
            self.debug_print("Request", &request_json);
        }

        let mut last_error = String::from("Unknown error");

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "Retry attempt {}/{} after {}ms: {}",
                    attempt,
                    MAX_RETRIES,
                    delay_ms,
                    last_error
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) if e.is_connect() && attempt < MAX_RETRIES => {
                    last_error = format!("Cannot connect to {}: {}", self.endpoint, e);
                    continue;
                }
                Err(e) => {
                    return Err(AideError::backend(format!(
                        "Request to {} failed: {}",
                        self.endpoint, e
                    )))
                }
            };

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();

                if Self::is_retryable(status.as_u16()) && attempt < MAX_RETRIES {
                    last_error = format!("HTTP {}: {}", status, error_text);
                    continue;
                }

                let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                    .map(|e| e.error.message)
                    .unwrap_or(error_text);
                return Err(AideError::backend(format!(
                    "API error ({}): {}",
                    status, message
                )));
            }

            let response_text = response.text().await?;
            self.debug_print("Response", &response_text);
            return Self::parse_response(&response_text);
        }

        Err(AideError::backend(format!(
            "Max retries exceeded: {}",
            last_error
        )))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_budget(budget: u32) -> AnthropicClient {
        let mut config = Config::default();
        config.backend.api_key = Some("test-key".to_string());
        config.backend.thinking_budget = budget;
        AnthropicClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_model_follows_config() {
        let mut config = Config::default();
        config.backend.api_key = Some("test-key".to_string());
        config.set_model("claude-test");
        assert_eq!(AnthropicClient::from_config(&config).unwrap().model(), "claude-test");
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = Config::default();
        config.backend.api_key = None;
        assert!(matches!(
            AnthropicClient::from_config(&config),
            Err(AideError::MissingApiKey)
        ));
    }

    #[test]
    fn test_thinking_budget_must_fit() {
        assert!(client_with_budget(0).thinking_config(16000).is_none());
        assert!(client_with_budget(4096).thinking_config(16000).is_some());
        assert!(client_with_budget(4096).thinking_config(2048).is_none());
    }

    #[test]
    fn test_parse_tool_use_response() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Let me add that."},
                {"type": "tool_use", "id": "toolu_1", "name": "add_calendar_event",
                 "input": {"title": "Team Sync", "date": "2026-10-19", "time": "15:00"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }"#;

        let response = AnthropicClient::parse_response(body).unwrap();
        assert_eq!(response.stop, StopCondition::ToolRequest);
        assert_eq!(response.text_content(), "Let me add that.");
        assert_eq!(response.tool_calls()[0].name, "add_calendar_event");
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let messages = vec![Message::user("hi")];
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: None,
            messages: &messages,
            tools: None,
            thinking: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("tools").is_none());
        assert!(value.get("thinking").is_none());
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(AnthropicClient::is_retryable(429));
        assert!(AnthropicClient::is_retryable(529));
        assert!(!AnthropicClient::is_retryable(400));
    }
}
