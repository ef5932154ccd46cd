//! CLI module - command-line interface
//!
//! Contains the REPL and slash-command parsing.

pub mod commands;
pub mod repl;

pub use repl::Repl;
