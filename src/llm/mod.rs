//! LLM module - model backend integrations
//!
//! Provides the backend abstraction the agent loops talk to, with the
//! Anthropic Messages API as the shipped implementation.

pub mod anthropic;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use traits::{ModelBackend, ModelRequest, ModelResponse};
