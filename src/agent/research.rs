//! Research sub-agent
//!
//! A nested run of the turn loop that can only search the web, bounded by
//! a per-task search quota. Its registry is created nested, so it cannot
//! hold another delegation tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::loop_state::WorkingBuffer;
use crate::agent::observer::SilentObserver;
use crate::agent::turn_loop::{CallDispatcher, LoopOutcome, SpawnedDispatch, TurnLoop};
use crate::core::config::ResearchConfig;
use crate::core::{Config, Message, Result, ToolCall};
use crate::llm::ModelBackend;
use crate::tools::search::{self, SearchProvider};
use crate::tools::ToolRegistry;

const RESEARCH_SYSTEM: &str = "You are a research specialist. Your job is to thoroughly investigate a topic by \
performing multiple targeted web searches, then synthesizing the findings into a \
clear, well-organized report. Search for different aspects of the topic, verify \
information across sources, and present a comprehensive summary with key facts.";

const SEARCH_TOOL: &str = "web_search";
const SEARCH_LIMIT_REACHED: &str = "Search limit reached.";
const NO_REPORT: &str = "Research sub-agent completed without producing a report.";

/// How much searching a research task may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    Quick,
    #[default]
    Thorough,
}

impl ResearchDepth {
    /// Search quota for this depth
    pub fn max_searches(&self, config: &ResearchConfig) -> usize {
        match self {
            ResearchDepth::Quick => config.quick_searches,
            ResearchDepth::Thorough => config.thorough_searches,
        }
    }
}

impl std::fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchDepth::Quick => write!(f, "quick"),
            ResearchDepth::Thorough => write!(f, "thorough"),
        }
    }
}

/// Counts searches and refuses those past the quota
struct QuotaDispatch {
    inner: SpawnedDispatch,
    used: usize,
    quota: usize,
}

#[async_trait]
impl CallDispatcher for QuotaDispatch {
    async fn dispatch(&mut self, call: &ToolCall) -> String {
        if call.name == SEARCH_TOOL {
            if self.used >= self.quota {
                log::info!("Research search quota of {} exhausted", self.quota);
                return SEARCH_LIMIT_REACHED.to_string();
            }
            self.used += 1;
        }
        self.inner.dispatch(call).await
    }
}

/// The research sub-agent
pub struct ResearchAgent {
    backend: Arc<dyn ModelBackend>,
    tools: Arc<ToolRegistry>,
    config: ResearchConfig,
}

impl ResearchAgent {
    /// Build a sub-agent whose only tool is `web_search` over `search`
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        search: Arc<dyn SearchProvider>,
        config: &Config,
    ) -> Result<Self> {
        let mut tools = ToolRegistry::nested();
        search::register(&mut tools, search, config.search.default_results)?;

        Ok(Self {
            backend,
            tools: Arc::new(tools),
            config: config.research.clone(),
        })
    }

    /// Research `task` and return a report; failures are folded into the text
    pub async fn run_research(&self, task: &str, depth: ResearchDepth) -> String {
        let max_searches = depth.max_searches(&self.config);
        log::info!("Research ({}, up to {} searches): {}", depth, max_searches, task);

        let prompt = format!(
            "Research the following topic thoroughly using up to {} web searches:\n\n{}\n\n\
             After your research, provide a comprehensive, well-organized summary.",
            max_searches, task
        );
        let mut buffer =
            WorkingBuffer::from_messages(vec![Message::user(prompt)], self.config.max_round_trips);
        let mut dispatcher = QuotaDispatch {
            inner: SpawnedDispatch::new(self.tools.clone()),
            used: 0,
            quota: max_searches,
        };

        let turn_loop = TurnLoop {
            backend: self.backend.as_ref(),
            system: RESEARCH_SYSTEM.to_string(),
            tools: self.tools.definitions(),
            max_tokens: self.config.max_tokens,
        };

        match turn_loop
            .run(&mut buffer, &mut dispatcher, &SilentObserver)
            .await
        {
            Ok(LoopOutcome::Complete(response)) => {
                log::info!("Research finished after {} searches", dispatcher.used);
                format!(
                    "[Research Sub-agent Report]\n\n{}",
                    response.first_text().unwrap_or_default()
                )
            }
            Ok(LoopOutcome::Stopped(_)) | Ok(LoopOutcome::RoundTripLimit) => NO_REPORT.to_string(),
            Err(e) => {
                log::warn!("Research sub-agent failed: {}", e);
                format!("Research sub-agent failed: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_defaults_to_thorough() {
        assert_eq!(ResearchDepth::default(), ResearchDepth::Thorough);
        let quick: ResearchDepth = serde_json::from_str("\"quick\"").unwrap();
        assert_eq!(quick, ResearchDepth::Quick);
        assert!(serde_json::from_str::<ResearchDepth>("\"deep\"").is_err());
    }

    #[test]
    fn test_quotas_follow_config() {
        let config = ResearchConfig::default();
        assert_eq!(ResearchDepth::Quick.max_searches(&config), 3);
        assert_eq!(ResearchDepth::Thorough.max_searches(&config), 6);
    }
}
