//! Custom error types for Aide
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Aide operations
#[derive(Error, Debug)]
pub enum AideError {
    /// Model backend transport or API errors
    #[error("Backend error: {0}")]
    Backend(String),

    /// Tool arguments did not match the tool's schema
    #[error("{0}")]
    InvalidArguments(String),

    /// Tool execution errors
    #[error("{0}")]
    ToolExecution(String),

    /// A tool name was registered twice, or in a registry that refuses it
    #[error("Tool registration error: {0}")]
    Registration(String),

    /// Path resolved outside the sandboxed workspace
    #[error("Access outside workspace is not allowed.")]
    WorkspaceEscape,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// API key missing from the environment
    #[error("ANTHROPIC_API_KEY is not set. Export it or add it to a .env file")]
    MissingApiKey,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Aide operations
pub type Result<T> = std::result::Result<T, AideError>;

impl AideError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an argument mismatch error
    pub fn arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a registration error
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the caller's arguments rather than the handler
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_are_classified() {
        assert!(AideError::arguments("missing field `title`").is_argument_error());
        assert!(!AideError::tool("disk full").is_argument_error());
        assert!(!AideError::WorkspaceEscape.is_argument_error());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AideError::WorkspaceEscape.to_string(),
            "Access outside workspace is not allowed."
        );
        assert_eq!(AideError::backend("503").to_string(), "Backend error: 503");
    }
}
