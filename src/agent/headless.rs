//! Headless chat surface
//!
//! JSON request and response types for driving one headless turn, e.g.
//! from another process. Each request runs on its own task over its own
//! copy of the caller's history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::history::ConversationHistory;
use crate::agent::orchestrator::Orchestrator;
use crate::core::{AideError, Result};

/// One headless chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: ConversationHistory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: ConversationHistory::new(),
            image_base64: None,
            image_mime_type: None,
        }
    }
}

/// Reply and updated history for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub history: ConversationHistory,
}

/// Run one headless turn on a dedicated task
pub async fn handle_chat(orchestrator: Arc<Orchestrator>, request: ChatRequest) -> Result<ChatResponse> {
    let task = tokio::spawn(async move {
        let ChatRequest {
            message,
            history,
            image_base64,
            image_mime_type,
        } = request;
        orchestrator
            .run_turn_headless(&message, &history, image_base64, image_mime_type)
            .await
    });

    let (reply, history) = task
        .await
        .map_err(|e| AideError::Other(format!("Chat task failed: {}", e)))??;
    Ok(ChatResponse { reply, history })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.message, "hi");
        assert!(request.history.is_empty());
        assert!(request.image_base64.is_none());
    }

    #[test]
    fn test_request_with_history() {
        let request: ChatRequest = serde_json::from_str(
            r#"{
                "message": "and tomorrow?",
                "history": [
                    {"role": "user", "content": "weather today?"},
                    {"role": "assistant", "content": "Sunny."}
                ],
                "image_mime_type": "image/png"
            }"#,
        )
        .unwrap();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.image_mime_type.as_deref(), Some("image/png"));
    }
}
