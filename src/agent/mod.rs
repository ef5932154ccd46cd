//! Agent module - orchestration and conversation management
//!
//! Contains the turn loop, the orchestrator that runs user turns through it,
//! the research sub-agent, and the durable/turn-scoped conversation state.

pub mod headless;
pub mod history;
pub mod loop_state;
pub mod observer;
pub mod orchestrator;
pub mod research;
pub mod turn_loop;

pub use headless::{handle_chat, ChatRequest, ChatResponse};
pub use history::{ConversationHistory, HistoryEntry};
pub use loop_state::WorkingBuffer;
pub use observer::{ConsoleObserver, SilentObserver, TurnObserver};
pub use orchestrator::Orchestrator;
pub use research::{ResearchAgent, ResearchDepth};
pub use turn_loop::{CallDispatcher, LoopOutcome, SpawnedDispatch, TurnLoop};
