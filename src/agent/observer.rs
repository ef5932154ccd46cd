//! Turn progress reporting
//!
//! The interactive loop narrates what it is doing through a `TurnObserver`.
//! Headless turns use `SilentObserver`.

use std::io::{self, Write};

/// Receives progress events from a running turn
pub trait TurnObserver: Send + Sync {
    /// The model produced reasoning
    fn on_thinking(&self) {}

    /// A non-empty text segment from one response
    fn on_text(&self, _text: &str) {}

    /// A tool is about to run
    fn on_tool_call(&self, _name: &str) {}

    /// A tool finished; `result` is the full result text
    fn on_tool_result(&self, _name: &str, _result: &str) {}
}

/// Observer that reports nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl TurnObserver for SilentObserver {}

/// Prints progress to stdout
#[derive(Debug, Clone)]
pub struct ConsoleObserver {
    preview_chars: usize,
}

impl ConsoleObserver {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new(120)
    }
}

impl TurnObserver for ConsoleObserver {
    fn on_thinking(&self) {
        println!("  (thinking...)");
    }

    fn on_text(&self, text: &str) {
        println!("\n{}", text);
    }

    fn on_tool_call(&self, name: &str) {
        println!("  ↳ tool: {}", name);
        let _ = io::stdout().flush();
    }

    fn on_tool_result(&self, _name: &str, result: &str) {
        println!("    ← {}", preview(result, self.preview_chars));
    }
}

/// Single-line preview of at most `max_chars` characters, with an ellipsis
/// when truncated
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut out: String = flat.chars().take(max_chars).collect();
    out.push('…');
    out
}
