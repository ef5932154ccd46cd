//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aide::core::{Result, ToolCall};
use aide::llm::{ModelBackend, ModelRequest, ModelResponse};
use aide::tools::{SearchHit, SearchProvider};
use aide::Config;
use async_trait::async_trait;
use tempfile::TempDir;

/// Backend that replays canned responses and records every request
///
/// Once the script runs out it answers `done`.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<ModelResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelResponse::text("done")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Search provider that answers every query with one hit and counts calls
#[derive(Default)]
pub struct CountingSearch {
    calls: AtomicUsize,
}

impl CountingSearch {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            url: "https://example.com/".to_string(),
            snippet: format!("Facts about {}.", query),
        }])
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = dir.path().join("data");
    config.storage.workspace_dir = dir.path().join("workspace");
    config
}

pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, arguments)
}
