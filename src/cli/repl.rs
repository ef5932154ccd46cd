//! Interactive REPL for Aide
//!
//! Provides the main user interaction loop. The REPL owns the durable
//! history; each turn hands the orchestrator a borrowed copy and keeps the
//! returned one only if the turn finished.

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{ConversationHistory, Orchestrator};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    orchestrator: Arc<Orchestrator>,
    history: ConversationHistory,
}

impl Repl {
    /// Create a REPL over an existing orchestrator
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            history: ConversationHistory::new(),
        }
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self::new(Arc::new(Orchestrator::from_config(config)?)))
    }

    /// Current durable history
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run one turn; Ctrl-C abandons it and keeps the previous history
    pub async fn turn(&mut self, input: &str) {
        println!("\nAssistant");

        let outcome = tokio::select! {
            result = self.orchestrator.run_turn(input, &self.history) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(Ok((_, history))) => self.history = history,
            Some(Err(e)) => eprintln!("Error: {}", e),
            None => println!("\nInterrupted."),
        }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let mut stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("\nYou: ");
            stdout.flush()?;

            // Read input
            let mut input = String::new();
            let read = tokio::select! {
                read = stdin.read_line(&mut input) => Some(read),
                _ = tokio::signal::ctrl_c() => None,
            };
            match read {
                None | Some(Ok(0)) => {
                    // Ctrl+C or EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &self.history) {
                CommandResult::Exit => {
                    println!("Goodbye!");
                    break;
                }
                CommandResult::Clear => {
                    self.history.clear();
                    println!("Conversation history cleared.");
                }
                CommandResult::Handled(output) => println!("{}", output),
                CommandResult::Continue(message) => self.turn(&message).await,
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.orchestrator.config();

        println!(
            r#"
╭───────────────────────────────────────────────────────────╮
│                                                           │
│   Aide - personal assistant                               │
│                                                           │
╰───────────────────────────────────────────────────────────╯
"#
        );
        println!("Model:      {}", config.backend.model);
        println!("Data:       {}", config.storage.data_dir.display());
        println!("Workspace:  {}", config.storage.workspace_dir.display());
        println!("Tools:      {}", self.orchestrator.tools().len());
        println!();
        println!("Type /help for commands, /quit to exit.");
        println!("─────────────────────────────────────────────────────────────");
    }
}
