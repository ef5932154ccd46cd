//! The agentic loop shared by the orchestrator and the research sub-agent
//!
//! Alternates between asking the backend for its next step and running the
//! tools it requested, until the backend finishes, stops for another
//! reason, or the round-trip bound is hit. Callers decide what each exit
//! means for their reply.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::loop_state::WorkingBuffer;
use crate::agent::observer::TurnObserver;
use crate::core::{ContentBlock, Result, StopCondition, ToolCall, ToolDefinition, ToolResult};
use crate::llm::{ModelBackend, ModelRequest, ModelResponse};
use crate::tools::registry::execution_error;
use crate::tools::ToolRegistry;

/// How a loop run ended
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    /// The backend finished its answer; carries the final response
    Complete(ModelResponse),
    /// The backend stopped for any other reason
    Stopped(String),
    /// The backend asked for another tool round past the bound
    RoundTripLimit,
}

/// Resolves the tool calls of one round to result text
#[async_trait]
pub trait CallDispatcher: Send {
    async fn dispatch(&mut self, call: &ToolCall) -> String;
}

/// Runs each call through a registry on its own task
///
/// The task is awaited right away, so calls stay sequential, but a turn
/// that is dropped mid-call leaves the tool running to completion.
pub struct SpawnedDispatch {
    tools: Arc<ToolRegistry>,
}

impl SpawnedDispatch {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl CallDispatcher for SpawnedDispatch {
    async fn dispatch(&mut self, call: &ToolCall) -> String {
        let tools = self.tools.clone();
        let name = call.name.clone();
        let arguments = call.arguments.clone();

        let handle = tokio::spawn(async move { tools.dispatch(&name, arguments).await });
        match handle.await {
            Ok(output) => output,
            Err(e) => {
                log::error!("Tool task for {} failed: {}", call.name, e);
                execution_error(&call.name, e)
            }
        }
    }
}

/// Fixed inputs for one loop run
pub struct TurnLoop<'a> {
    pub backend: &'a dyn ModelBackend,
    pub system: String,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
}

impl TurnLoop<'_> {
    /// Drive the loop until it exits; backend errors propagate
    pub async fn run<D: CallDispatcher>(
        &self,
        buffer: &mut WorkingBuffer,
        dispatcher: &mut D,
        observer: &dyn TurnObserver,
    ) -> Result<LoopOutcome> {
        loop {
            let request = ModelRequest {
                system: self.system.clone(),
                tools: self.tools.clone(),
                messages: buffer.messages().to_vec(),
                max_tokens: self.max_tokens,
            };

            log::debug!(
                "Round trip {}/{}: sending {} messages to {}",
                buffer.round_trips() + 1,
                buffer.max_round_trips(),
                request.messages.len(),
                self.backend.name()
            );
            let response = self.backend.complete(&request).await?;

            if response
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking { .. }))
            {
                observer.on_thinking();
            }

            let text = response.text_content();
            if !text.is_empty() {
                observer.on_text(&text);
            }
            buffer.record_text(&text);

            match response.stop.clone() {
                StopCondition::Complete => {
                    log::debug!("Loop complete after {} round trips", buffer.round_trips());
                    return Ok(LoopOutcome::Complete(response));
                }
                StopCondition::Other(reason) => {
                    log::warn!("Backend stopped unexpectedly: {}", reason);
                    return Ok(LoopOutcome::Stopped(reason));
                }
                StopCondition::ToolRequest => {}
            }

            let calls = response.tool_calls();
            if calls.is_empty() {
                log::warn!("Backend requested tools but sent no tool calls");
                return Ok(LoopOutcome::Stopped("tool_use without tool calls".to_string()));
            }
            if !buffer.should_continue() {
                log::warn!(
                    "Round-trip limit of {} reached, ending loop",
                    buffer.max_round_trips()
                );
                return Ok(LoopOutcome::RoundTripLimit);
            }

            buffer.push_assistant(response.content);

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                log::info!("Calling tool {}", call.name);
                observer.on_tool_call(&call.name);
                let output = dispatcher.dispatch(call).await;
                observer.on_tool_result(&call.name, &output);
                results.push(ToolResult::new(&call.id, output));
            }

            buffer.push_tool_results(results);
            buffer.next_round_trip();
        }
    }
}
