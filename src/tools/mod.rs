//! Tools module - Tool implementations for the agent
//!
//! Contains the tool registry, the personal-data collaborators, web search,
//! and the research delegation tool.

pub mod calendar;
pub mod files;
pub mod memory;
pub mod notes;
pub mod registry;
pub mod reminders;
pub mod research;
pub mod search;
pub mod store;

use std::sync::Arc;

pub use registry::{ToolHandler, ToolRegistry};
pub use search::{DuckDuckGoClient, SearchHit, SearchProvider};

use crate::agent::research::ResearchAgent;
use crate::core::{Config, Result};

/// Build the top-level registry with every tool the assistant offers
pub fn standard_registry(
    config: &Config,
    search: Arc<dyn SearchProvider>,
    research: Arc<ResearchAgent>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    let data_dir = &config.storage.data_dir;

    search::register(&mut registry, search, config.search.default_results)?;
    calendar::register(&mut registry, data_dir)?;
    notes::register(&mut registry, data_dir)?;
    reminders::register(&mut registry, data_dir)?;
    memory::register(&mut registry, data_dir)?;
    files::register(&mut registry, &config.storage.workspace_dir)?;

    research::register(&mut registry, research)?;

    log::debug!("Registered {} tools", registry.len());
    Ok(registry)
}
