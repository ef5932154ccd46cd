//! Model backend trait
//!
//! The agent loops only see this interface, so tests can swap in a scripted
//! backend and the HTTP client stays replaceable.

use async_trait::async_trait;

use crate::core::{ContentBlock, Message, Result, StopCondition, ToolCall, ToolDefinition};

/// One request to the model backend
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System instructions
    pub system: String,
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Conversation so far, oldest first
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Response from the model backend
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Content blocks in the order the backend produced them
    pub content: Vec<ContentBlock>,
    /// Why generation stopped
    pub stop: StopCondition,
}

impl ModelResponse {
    /// A text-only final answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(content)],
            stop: StopCondition::Complete,
        }
    }

    /// A response requesting the given tool calls
    pub fn with_tools(text: Option<&str>, calls: Vec<ToolCall>) -> Self {
        let mut content = Vec::with_capacity(calls.len() + 1);
        if let Some(text) = text {
            content.push(ContentBlock::text(text));
        }
        content.extend(calls.into_iter().map(|c| ContentBlock::ToolUse {
            id: c.id,
            name: c.name,
            input: c.arguments,
        }));
        Self {
            content,
            stop: StopCondition::ToolRequest,
        }
    }

    /// Concatenated text blocks
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First text block only
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool calls in request order
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content.iter().filter_map(ToolCall::from_block).collect()
    }
}

/// Trait for model backends
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Ask the model for its next step
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse>;

    /// Get the backend name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_response() {
        let response = ModelResponse::text("Hello world");
        assert_eq!(response.text_content(), "Hello world");
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.stop, StopCondition::Complete);
    }

    #[test]
    fn test_tool_response_keeps_order() {
        let response = ModelResponse::with_tools(
            Some("Checking."),
            vec![
                ToolCall::new("a", "recall", json!({})),
                ToolCall::new("b", "check_reminders", json!({})),
            ],
        );
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].name, "check_reminders");
        assert_eq!(response.first_text(), Some("Checking."));
        assert_eq!(response.stop, StopCondition::ToolRequest);
    }
}
