//! Aide - tool-augmented personal assistant
//!
//! An agent that answers each user turn by looping between a model backend
//! and a registry of local tools (calendar, notes, reminders, memory, a
//! sandboxed file workspace, web search) until the model produces a final
//! answer. Open-ended questions can be delegated to a research sub-agent
//! that runs its own bounded loop with a search quota.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Model backend abstraction with an Anthropic Messages implementation
//! - **Tools**: Tool registry, dispatcher and the built-in tool collaborators
//! - **Agent**: Turn loop, orchestrator, research sub-agent and conversation state
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use aide::{Config, ConversationHistory, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> aide::Result<()> {
//!     let orchestrator = Orchestrator::from_config(Config::load())?;
//!     let history = ConversationHistory::new();
//!
//!     let (reply, history) = orchestrator
//!         .run_turn_headless("What's on my calendar today?", &history, None, None)
//!         .await?;
//!     println!("{} ({} messages)", reply, history.len());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{ConversationHistory, Orchestrator, ResearchDepth};
pub use cli::Repl;
pub use core::{AideError, Config, Result};
