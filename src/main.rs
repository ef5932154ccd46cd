//! Aide - tool-augmented personal assistant
//!
//! Main entry point for the CLI application.

use std::io::Read;
use std::sync::Arc;

use aide::agent::{handle_chat, ChatRequest};
use aide::{Config, Orchestrator, Repl};
use clap::Parser;

/// Aide - personal assistant with calendar, notes, reminders, memory, files and research
#[derive(Parser, Debug)]
#[command(name = "aide")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use for both the assistant and the research sub-agent
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Headless mode: read a chat request as JSON on stdin, write the response as JSON
    #[arg(long, conflicts_with = "prompt")]
    json: bool,

    /// Write the default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.init_config {
        let path = Config::config_file();
        if path.exists() {
            println!("Configuration already exists at {}", path.display());
            println!("Defaults for reference:\n\n{}", Config::default_config_toml());
        } else {
            let path = Config::default().save_and_get_path()?;
            println!("Wrote default configuration to {}", path.display());
        }
        return Ok(());
    }

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.set_model(model);
    }

    if args.debug {
        config.agent.debug = true;
    }

    // Headless JSON mode
    if args.json {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let request: ChatRequest = serde_json::from_str(&input)?;

        let orchestrator = Arc::new(Orchestrator::from_config(config)?);
        let response = handle_chat(orchestrator, request).await?;
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let orchestrator = Arc::new(Orchestrator::from_config(config)?);
        let mut repl = Repl::new(orchestrator);
        repl.turn(&prompt).await;
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
