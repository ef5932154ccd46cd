//! The `research_task` delegation tool

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::research::{ResearchAgent, ResearchDepth};
use crate::core::{Result, ToolCategory, ToolDefinition};
use crate::tools::registry::{parse_args, ToolHandler, ToolRegistry};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResearchArgs {
    task: String,
    #[serde(default)]
    depth: Option<ResearchDepth>,
}

/// Hands a task to the research sub-agent
pub struct ResearchTool {
    agent: Arc<ResearchAgent>,
}

impl ResearchTool {
    pub fn new(agent: Arc<ResearchAgent>) -> Self {
        Self { agent }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "research_task",
            "Delegate a complex multi-step research task to a specialized research sub-agent. \
             Use this when a question requires multiple searches, synthesis, or deep investigation. \
             The sub-agent will perform several web searches and return a comprehensive summary.",
            json!({
                "type": "object",
                "properties": {
                    "task": {"type": "string", "description": "The research task or question to investigate"},
                    "depth": {"type": "string", "enum": ["quick", "thorough"], "description": "Research depth (default 'thorough')"}
                },
                "required": ["task"]
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for ResearchTool {
    async fn call(&self, arguments: Value) -> Result<String> {
        let args: ResearchArgs = parse_args(arguments)?;
        Ok(self
            .agent
            .run_research(&args.task, args.depth.unwrap_or_default())
            .await)
    }
}

/// Register `research_task`; a nested registry refuses it
pub fn register(registry: &mut ToolRegistry, agent: Arc<ResearchAgent>) -> Result<()> {
    registry.register(
        ResearchTool::definition(),
        ToolCategory::Delegation,
        Arc::new(ResearchTool::new(agent)),
    )
}
