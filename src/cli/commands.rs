//! CLI commands
//!
//! Slash commands that can be executed in the REPL.

use crate::agent::ConversationHistory;

const HISTORY_SHOWN: usize = 6;
const HISTORY_PREVIEW_CHARS: usize = 80;

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
}

/// Parse and handle slash commands; anything else is a message for the agent
pub fn handle_command(input: &str, history: &ConversationHistory) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::Continue(input.to_string());
    }

    let cmd = input
        .split_whitespace()
        .next()
        .unwrap_or(input)
        .to_lowercase();

    match cmd.as_str() {
        "/quit" | "/exit" | "/q" => CommandResult::Exit,
        "/clear" => CommandResult::Clear,
        "/help" => CommandResult::Handled(help_text()),
        "/history" => CommandResult::Handled(history_summary(history)),
        _ => CommandResult::Handled(format!(
            "Unknown command: {}. Type /help for a list of commands.",
            cmd
        )),
    }
}

/// Entry count plus the most recent entries, one line each
pub fn history_summary(history: &ConversationHistory) -> String {
    if history.is_empty() {
        return "No conversation history yet.".to_string();
    }

    let mut lines = vec![format!("Conversation has {} messages.", history.len())];
    for entry in history.last_n(HISTORY_SHOWN) {
        let mut content: String = entry
            .content
            .chars()
            .take(HISTORY_PREVIEW_CHARS)
            .collect::<String>()
            .replace('\n', " ");
        if entry.content.chars().count() > HISTORY_PREVIEW_CHARS {
            content.push('…');
        }
        lines.push(format!(
            "  {}: {}",
            entry.role.as_str().to_uppercase(),
            content
        ));
    }
    lines.join("\n")
}

/// Generate help text
fn help_text() -> String {
    r#"Commands:
─────────────────────────────────────────────
  /help            Show this help
  /history         Show conversation history summary
  /clear           Clear conversation history (start fresh)
  /quit            Exit the assistant (also /exit, /q)

Example prompts:
  "What's the weather in Tokyo?"
  "Add a meeting tomorrow at 3pm called Team Sync"
  "Show my calendar for this week"
  "Create a note about my project ideas"
  "Set a reminder for 2026-11-01T09:00 to review Q4 goals"
  "Remember that I prefer dark mode"
  "Research the latest developments in quantum computing"

Keyboard Shortcuts:
  Ctrl+C           Interrupt the current turn
  Ctrl+D           Exit
─────────────────────────────────────────────"#
        .to_string()
}
