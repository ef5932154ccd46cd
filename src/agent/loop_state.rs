//! Agent loop state management
//!
//! The working buffer is the turn-scoped message list the model sees while
//! it calls tools. It is built from durable history, grows with tool
//! bookkeeping, and is dropped when the turn ends.

use crate::agent::history::ConversationHistory;
use crate::core::{ContentBlock, ImageSource, Message, Role, ToolResult};

/// State of one run of the agent loop
#[derive(Debug, Clone)]
pub struct WorkingBuffer {
    /// Messages sent to the backend on the next call
    messages: Vec<Message>,
    /// Completed tool rounds
    round_trips: usize,
    /// Maximum allowed tool rounds
    max_round_trips: usize,
    /// Latest non-empty text the model produced
    candidate_reply: Option<String>,
}

impl WorkingBuffer {
    /// Seed from durable history plus the new user message
    ///
    /// An image is attached to the new message only, ahead of the text.
    pub fn seed(
        history: &ConversationHistory,
        user_message: &str,
        image: Option<ImageSource>,
        max_round_trips: usize,
    ) -> Self {
        let mut messages = history.to_messages();
        messages.push(match image {
            Some(source) => Message::with_blocks(
                Role::User,
                vec![ContentBlock::image(source), ContentBlock::text(user_message)],
            ),
            None => Message::user(user_message),
        });

        Self::from_messages(messages, max_round_trips)
    }

    /// Start from an explicit message list
    pub fn from_messages(messages: Vec<Message>, max_round_trips: usize) -> Self {
        Self {
            messages,
            round_trips: 0,
            max_round_trips,
            candidate_reply: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    pub fn max_round_trips(&self) -> usize {
        self.max_round_trips
    }

    /// Record the joined text of a response; empty text keeps the previous candidate
    pub fn record_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.candidate_reply = Some(text.to_string());
        }
    }

    pub fn candidate_reply(&self) -> Option<&str> {
        self.candidate_reply.as_deref()
    }

    /// Candidate reply, or `sentinel` when the model never produced text
    pub fn reply_or(&self, sentinel: &str) -> String {
        self.candidate_reply
            .clone()
            .unwrap_or_else(|| sentinel.to_string())
    }

    /// Append the assistant's raw response, reasoning and tool calls included
    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) {
        let blocks: Vec<ContentBlock> = blocks.into_iter().filter(|b| b.is_replayable()).collect();
        self.messages.push(Message::with_blocks(Role::Assistant, blocks));
    }

    /// Append one user message holding every result of the round, in call order
    pub fn push_tool_results(&mut self, results: Vec<ToolResult>) {
        self.messages.push(Message::tool_results(results));
    }

    /// Whether another tool round is allowed
    pub fn should_continue(&self) -> bool {
        self.round_trips < self.max_round_trips
    }

    /// Increment the round-trip counter
    pub fn next_round_trip(&mut self) {
        self.round_trips += 1;
    }
}
