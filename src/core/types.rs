//! Shared types used across Aide modules
//!
//! Contains message structures, content blocks, tool definitions and the
//! stop condition reported by the model backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source of an inline image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    /// Base64-encoded image data
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// One block of structured message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Internal reasoning. Round-tripped to the backend, never inspected.
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: String,
    },
    RedactedThinking {
        data: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    Image {
        source: ImageSource,
    },
    /// Block types this crate does not model; dropped before resending
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(source: ImageSource) -> Self {
        ContentBlock::Image { source }
    }

    /// Whether this block can be sent back to the backend
    pub fn is_replayable(&self) -> bool {
        !matches!(self, ContentBlock::Unsupported)
    }
}

/// Content can be either a string or a list of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A message sent to the model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// Create a plain-text user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a message from raw content blocks
    pub fn with_blocks(role: Role, blocks: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Create the user-role message that answers one assistant tool round
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::with_blocks(
            Role::User,
            results.into_iter().map(ContentBlock::from).collect(),
        )
    }

    /// Plain text carried by this message, with non-text blocks skipped
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Whether any block in this message is of a kind that may not persist
    pub fn has_structured_content(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .any(|b| !matches!(b, ContentBlock::Text { .. })),
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id, echoed back in the matching result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Extract the tool call from a `tool_use` block
    pub fn from_block(block: &ContentBlock) -> Option<Self> {
        match block {
            ContentBlock::ToolUse { id, name, input } => {
                Some(Self::new(id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        }
    }
}

/// Result of one tool call, always text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

impl From<ToolResult> for ContentBlock {
    fn from(result: ToolResult) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: result.tool_call_id,
            content: result.content,
            is_error: None,
        }
    }
}

/// Definition of a tool that can be called by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Category of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Web search
    Search,
    /// Calendar events
    Calendar,
    /// Notes
    Notes,
    /// Reminders
    Reminders,
    /// Long-lived key/value memory
    Memory,
    /// Sandboxed workspace files
    Files,
    /// Tools that run another agent loop
    Delegation,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCategory::Search => write!(f, "search"),
            ToolCategory::Calendar => write!(f, "calendar"),
            ToolCategory::Notes => write!(f, "notes"),
            ToolCategory::Reminders => write!(f, "reminders"),
            ToolCategory::Memory => write!(f, "memory"),
            ToolCategory::Files => write!(f, "files"),
            ToolCategory::Delegation => write!(f, "delegation"),
        }
    }
}

/// Why the backend stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCondition {
    /// Final answer produced (`end_turn`)
    Complete,
    /// One or more tool calls requested (`tool_use`)
    ToolRequest,
    /// Anything else; terminal for the turn
    Other(String),
}

impl StopCondition {
    /// Map the backend's raw stop reason
    pub fn from_stop_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("end_turn") => StopCondition::Complete,
            Some("tool_use") => StopCondition::ToolRequest,
            Some(other) => StopCondition::Other(other.to_string()),
            None => StopCondition::Other("missing stop reason".to_string()),
        }
    }
}
