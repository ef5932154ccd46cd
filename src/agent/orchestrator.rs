//! Conversation orchestrator
//!
//! Runs one user turn: seeds a working buffer from durable history, drives
//! the turn loop against the model backend and the tool registry, and
//! projects the outcome back into a new durable history.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::agent::history::ConversationHistory;
use crate::agent::loop_state::WorkingBuffer;
use crate::agent::observer::{ConsoleObserver, SilentObserver, TurnObserver};
use crate::agent::research::{ResearchAgent, ResearchDepth};
use crate::agent::turn_loop::{LoopOutcome, SpawnedDispatch, TurnLoop};
use crate::core::{Config, ImageSource, Result};
use crate::llm::{AnthropicClient, ModelBackend};
use crate::tools::{self, DuckDuckGoClient, SearchProvider, ToolRegistry};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const ROUND_TRIP_LIMIT: &str = "(stopped: round-trip limit reached)";

/// History placeholders used when a turn ends without any text
#[derive(Debug, Clone, Copy)]
struct Sentinels {
    /// Finished normally with no text
    empty: &'static str,
    /// Stopped for an unexpected reason with no text
    stopped: &'static str,
}

const INTERACTIVE: Sentinels = Sentinels {
    empty: "(no text response)",
    stopped: "(stopped unexpectedly)",
};

const HEADLESS: Sentinels = Sentinels {
    empty: "(no response)",
    stopped: "(stopped)",
};

/// System instructions for the main assistant
pub fn system_prompt(today: NaiveDate) -> String {
    format!(
        r#"You are a highly capable personal assistant. Today's date is {}.

You have access to the following capabilities:
- **Web search**: Look up current information, news, weather, and facts
- **Calendar**: Add, list, update, and delete events
- **Notes**: Create, search, read, update, and delete notes
- **Reminders**: Set reminders and check what's upcoming or overdue
- **Memory**: Remember user preferences and important info across conversations
- **File workspace**: Read and write files in the user's personal workspace
- **Research**: Delegate complex multi-step research to a specialized sub-agent

Guidelines:
- Always check relevant data (calendar, reminders, memory) proactively when contextually useful
- Be concise in responses but thorough when detail is needed
- When given ambiguous dates, assume the nearest future occurrence
- Store important user preferences using the remember tool
- For research tasks requiring multiple searches, use the research_task sub-agent
"#,
        today.format("%Y-%m-%d")
    )
}

/// Main agent that coordinates the backend and tools
pub struct Orchestrator {
    /// Configuration
    config: Config,
    /// Model backend
    backend: Arc<dyn ModelBackend>,
    /// Tool registry, shared with spawned tool tasks
    tools: Arc<ToolRegistry>,
    /// Research sub-agent, for direct delegation
    research: Arc<ResearchAgent>,
}

impl Orchestrator {
    /// Create an orchestrator over explicit collaborators
    pub fn new(
        config: Config,
        backend: Arc<dyn ModelBackend>,
        search: Arc<dyn SearchProvider>,
    ) -> Result<Self> {
        let research = Arc::new(ResearchAgent::new(backend.clone(), search.clone(), &config)?);
        let tools = tools::standard_registry(&config, search, research.clone())?;
        Ok(Self::with_registry(config, backend, tools, research))
    }

    /// Create an orchestrator over a prebuilt registry
    pub fn with_registry(
        config: Config,
        backend: Arc<dyn ModelBackend>,
        tools: ToolRegistry,
        research: Arc<ResearchAgent>,
    ) -> Self {
        Self {
            config,
            backend,
            tools: Arc::new(tools),
            research,
        }
    }

    /// Create an orchestrator with the Anthropic backend and DuckDuckGo search
    pub fn from_config(config: Config) -> Result<Self> {
        let client = AnthropicClient::from_config(&config)?;
        log::info!("Using model {}", client.model());
        let backend: Arc<dyn ModelBackend> = Arc::new(client);
        let search: Arc<dyn SearchProvider> =
            Arc::new(DuckDuckGoClient::from_config(&config.search)?);
        Self::new(config, backend, search)
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Process one interactive turn, printing progress to the console
    pub async fn run_turn(
        &self,
        user_message: &str,
        history: &ConversationHistory,
    ) -> Result<(String, ConversationHistory)> {
        let observer = ConsoleObserver::new(self.config.agent.preview_chars);
        self.run_turn_observed(user_message, history, &observer)
            .await
    }

    /// Process one interactive turn, reporting progress to `observer`
    pub async fn run_turn_observed(
        &self,
        user_message: &str,
        history: &ConversationHistory,
        observer: &dyn TurnObserver,
    ) -> Result<(String, ConversationHistory)> {
        self.turn(user_message, history, None, INTERACTIVE, observer)
            .await
    }

    /// Process one turn without console output, optionally with an image
    ///
    /// The image is sent with this message only; durable history keeps the text.
    pub async fn run_turn_headless(
        &self,
        user_message: &str,
        history: &ConversationHistory,
        image_base64: Option<String>,
        image_mime_type: Option<String>,
    ) -> Result<(String, ConversationHistory)> {
        let image = image_base64.filter(|data| !data.is_empty()).map(|data| {
            let mime = image_mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
            ImageSource::base64(mime, data)
        });
        self.turn(user_message, history, image, HEADLESS, &SilentObserver)
            .await
    }

    /// Delegate a task straight to the research sub-agent
    pub async fn run_research(&self, task: &str, depth: ResearchDepth) -> String {
        self.research.run_research(task, depth).await
    }

    async fn turn(
        &self,
        user_message: &str,
        history: &ConversationHistory,
        image: Option<ImageSource>,
        sentinels: Sentinels,
        observer: &dyn TurnObserver,
    ) -> Result<(String, ConversationHistory)> {
        let mut buffer = WorkingBuffer::seed(
            history,
            user_message,
            image,
            self.config.agent.max_round_trips,
        );
        let mut dispatcher = SpawnedDispatch::new(self.tools.clone());

        let turn_loop = TurnLoop {
            backend: self.backend.as_ref(),
            system: system_prompt(chrono::Local::now().date_naive()),
            tools: self.tools.definitions(),
            max_tokens: self.config.backend.max_tokens,
        };

        let outcome = turn_loop.run(&mut buffer, &mut dispatcher, observer).await?;

        let recorded = match outcome {
            LoopOutcome::Complete(_) => buffer.reply_or(sentinels.empty),
            LoopOutcome::Stopped(_) => buffer.reply_or(sentinels.stopped),
            LoopOutcome::RoundTripLimit => buffer.reply_or(ROUND_TRIP_LIMIT),
        };
        log::debug!(
            "Turn finished after {} round trips",
            buffer.round_trips()
        );

        let reply = buffer.candidate_reply().unwrap_or_default().to_string();
        Ok((reply, history.record_turn(user_message, recorded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let prompt = system_prompt(date);
        assert!(prompt.contains("Today's date is 2026-10-18."));
        assert!(prompt.contains("research_task"));
    }
}
