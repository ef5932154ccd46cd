//! Durable conversation history
//!
//! The cross-turn transcript. Entries hold plain text only, so tool calls,
//! reasoning blocks and images cannot leak into it. The orchestrator never
//! mutates a caller's history; each turn returns a new copy.

use serde::{Deserialize, Serialize};

use crate::core::{Message, Role};

/// One durable transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Replay as a plain-text model message
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(&self.content),
            Role::Assistant => Message::assistant(&self.content),
        }
    }
}

/// Ordered, append-only transcript; serialized as a JSON array of entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Get the last N entries
    pub fn last_n(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replay the transcript as model messages
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries.iter().map(HistoryEntry::to_message).collect()
    }

    /// The history after one completed turn: this one plus the user's text
    /// and the assistant's final reply
    pub fn record_turn(&self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 2);
        entries.extend(self.entries.iter().cloned());
        entries.push(HistoryEntry::user(user));
        entries.push(HistoryEntry::assistant(assistant));
        Self { entries }
    }
}

impl From<Vec<HistoryEntry>> for ConversationHistory {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        Self::from_entries(entries)
    }
}
