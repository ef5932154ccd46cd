//! Turn loop integration tests
//!
//! Drives whole turns through the orchestrator with a scripted backend and
//! real tool collaborators over temporary directories.

mod common;

use std::sync::{Arc, Mutex};

use aide::agent::observer::preview;
use aide::agent::{ResearchAgent, SilentObserver, TurnObserver};
use aide::core::{
    AideError, ContentBlock, Message, MessageContent, Result, Role, StopCondition, ToolCategory,
    ToolDefinition,
};
use aide::llm::ModelResponse;
use aide::tools::{ToolHandler, ToolRegistry};
use aide::{Config, ConversationHistory, Orchestrator};
use async_trait::async_trait;
use common::{call, test_config, CountingSearch, ScriptedBackend};
use serde_json::{json, Value};

fn orchestrator(config: Config, backend: Arc<ScriptedBackend>) -> Orchestrator {
    Orchestrator::new(config, backend, Arc::new(CountingSearch::default())).unwrap()
}

/// Tool result texts carried by a message, in order
fn tool_results(message: &Message) -> Vec<String> {
    match &message.content {
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect(),
        MessageContent::Text(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_calendar_turn_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![
        Ok(ModelResponse::with_tools(
            Some("Let me add that."),
            vec![call(
                "toolu_1",
                "add_calendar_event",
                json!({"title": "Team Sync", "date": "2026-10-19", "time": "15:00"}),
            )],
        )),
        Ok(ModelResponse::text("Added Team Sync for tomorrow at 3pm.")),
    ]);
    let agent = orchestrator(test_config(&dir), backend.clone());

    let (reply, history) = agent
        .run_turn_headless(
            "Add a meeting tomorrow at 3pm called Team Sync",
            &ConversationHistory::new(),
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(reply, "Added Team Sync for tomorrow at 3pm.");
    assert_eq!(history.len(), 2);
    assert_eq!(
        history.entries()[0].content,
        "Add a meeting tomorrow at 3pm called Team Sync"
    );
    assert_eq!(history.entries()[1].role, Role::Assistant);
    assert_eq!(history.entries()[1].content, reply);

    // Tool traffic stays in the working buffer, never in durable history
    assert!(history
        .to_messages()
        .iter()
        .all(|m| !m.has_structured_content()));

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    let second = &requests[1].messages;
    assert_eq!(second.len(), 3);
    assert_eq!(second[1].role, Role::Assistant);
    let results = tool_results(&second[2]);
    assert_eq!(results.len(), 1);
    assert!(results[0].starts_with("Added event 'Team Sync' on 2026-10-19 at 15:00 (ID: "));

    let listed = agent
        .tools()
        .dispatch("list_calendar_events", json!({"start_date": "2026-10-19"}))
        .await;
    assert!(listed.contains("Team Sync"));
}

#[tokio::test]
async fn test_unknown_and_malformed_calls_become_results() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![
        Ok(ModelResponse::with_tools(
            None,
            vec![
                call("a", "teleport", json!({"to": "Mars"})),
                call("b", "add_calendar_event", json!({"title": "No date"})),
                call("c", "recall", json!({"key": "tz", "colour": "blue"})),
            ],
        )),
        Ok(ModelResponse::text("I can't do that.")),
    ]);
    let agent = orchestrator(test_config(&dir), backend.clone());

    let (reply, _) = agent
        .run_turn_headless("Teleport me", &ConversationHistory::new(), None, None)
        .await
        .unwrap();
    assert_eq!(reply, "I can't do that.");

    let requests = backend.requests();
    let results = tool_results(requests[1].messages.last().unwrap());
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "Unknown tool: teleport");
    assert!(results[1].starts_with("Tool call error for 'add_calendar_event': "));
    assert!(results[1].contains("date"));
    assert!(results[2].starts_with("Tool call error for 'recall': "));
}

#[tokio::test]
async fn test_failing_handlers_are_reported_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![
        Ok(ModelResponse::with_tools(
            None,
            vec![
                call(
                    "a",
                    "add_calendar_event",
                    json!({"title": "Dentist", "date": "next tuesday"}),
                ),
                call("b", "read_file", json!({"path": "../../etc/passwd"})),
            ],
        )),
        Ok(ModelResponse::text("Both failed.")),
    ]);
    let agent = orchestrator(test_config(&dir), backend.clone());

    let (reply, history) = agent
        .run_turn_headless("Do two things", &ConversationHistory::new(), None, None)
        .await
        .unwrap();
    assert_eq!(reply, "Both failed.");
    assert_eq!(history.len(), 2);

    let results = tool_results(backend.requests()[1].messages.last().unwrap());
    assert!(results[0].starts_with("Error executing 'add_calendar_event': "));
    assert_eq!(
        results[1],
        "Error executing 'read_file': Access outside workspace is not allowed."
    );
}

#[tokio::test]
async fn test_round_trip_bound() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.agent.max_round_trips = 2;

    let looping = || -> Result<ModelResponse> {
        Ok(ModelResponse::with_tools(
            None,
            vec![call("x", "recall", json!({}))],
        ))
    };
    let backend = ScriptedBackend::new(vec![looping(), looping(), looping(), looping()]);
    let agent = orchestrator(config, backend.clone());

    let (reply, history) = agent
        .run_turn_headless("Loop forever", &ConversationHistory::new(), None, None)
        .await
        .unwrap();

    // Two tool rounds run; the third request ends the turn
    assert_eq!(backend.requests().len(), 3);
    assert_eq!(reply, "");
    assert_eq!(
        history.last().unwrap().content,
        "(stopped: round-trip limit reached)"
    );
}

#[tokio::test]
async fn test_recall_does_not_touch_store() {
    let dir = tempfile::tempdir().unwrap();
    let agent = orchestrator(test_config(&dir), ScriptedBackend::new(Vec::new()));
    let tools = agent.tools();

    let stored = tools
        .dispatch(
            "remember",
            json!({"key": "timezone", "value": "Europe/Lisbon", "category": "preferences"}),
        )
        .await;
    assert_eq!(stored, "Remembered [preferences] timezone: Europe/Lisbon");

    let path = dir.path().join("data").join("memory.json");
    let before = std::fs::read(&path).unwrap();

    let first = tools.dispatch("recall", json!({"key": "timezone"})).await;
    let second = tools.dispatch("recall", json!({"key": "timezone"})).await;
    assert_eq!(first, "[preferences] timezone: Europe/Lisbon");
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn test_unexpected_stop_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let truncated = || -> Result<ModelResponse> {
        Ok(ModelResponse {
            content: Vec::new(),
            stop: StopCondition::Other("max_tokens".to_string()),
        })
    };
    let backend = ScriptedBackend::new(vec![truncated(), truncated()]);
    let agent = orchestrator(test_config(&dir), backend);
    let empty = ConversationHistory::new();

    let (reply, history) = agent
        .run_turn_headless("Write an essay", &empty, None, None)
        .await
        .unwrap();
    assert_eq!(reply, "");
    assert_eq!(history.last().unwrap().content, "(stopped)");

    let (_, history) = agent
        .run_turn_observed("Write an essay", &empty, &SilentObserver)
        .await
        .unwrap();
    assert_eq!(history.last().unwrap().content, "(stopped unexpectedly)");
}

#[tokio::test]
async fn test_partial_text_survives_unexpected_stop() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![Ok(ModelResponse {
        content: vec![ContentBlock::text("Here is the start of")],
        stop: StopCondition::Other("max_tokens".to_string()),
    })]);
    let agent = orchestrator(test_config(&dir), backend);

    let (reply, history) = agent
        .run_turn_headless("Write an essay", &ConversationHistory::new(), None, None)
        .await
        .unwrap();
    assert_eq!(reply, "Here is the start of");
    assert_eq!(history.last().unwrap().content, "Here is the start of");
}

#[tokio::test]
async fn test_backend_error_leaves_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![Err(AideError::backend("503 overloaded"))]);
    let agent = orchestrator(test_config(&dir), backend);

    let history = ConversationHistory::new().record_turn("hi", "Hello!");
    let result = agent
        .run_turn_headless("What's next?", &history, None, None)
        .await;

    assert!(matches!(result, Err(AideError::Backend(_))));
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().content, "Hello!");
}

#[tokio::test]
async fn test_headless_image_rides_on_newest_message_only() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(vec![Ok(ModelResponse::text("A cat."))]);
    let agent = orchestrator(test_config(&dir), backend.clone());

    let history = ConversationHistory::new().record_turn("hi", "Hello!");
    let (reply, history) = agent
        .run_turn_headless(
            "What is in this picture?",
            &history,
            Some("aGVsbG8=".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(reply, "A cat.");

    let messages = &backend.requests()[0].messages;
    assert_eq!(messages.len(), 3);
    assert!(!messages[0].has_structured_content());
    assert!(!messages[1].has_structured_content());
    match &messages[2].content {
        MessageContent::Blocks(blocks) => {
            assert_eq!(blocks.len(), 2);
            match &blocks[0] {
                ContentBlock::Image { source } => {
                    assert_eq!(source.media_type, "image/jpeg");
                    assert_eq!(source.data, "aGVsbG8=");
                }
                other => panic!("expected image block, got {:?}", other),
            }
            assert_eq!(blocks[1], ContentBlock::text("What is in this picture?"));
        }
        MessageContent::Text(_) => panic!("expected image blocks on the newest message"),
    }

    // Only the text is kept
    assert_eq!(history.len(), 4);
    assert_eq!(history.entries()[2].content, "What is in this picture?");
    assert!(history
        .to_messages()
        .iter()
        .all(|m| !m.has_structured_content()));
}

#[tokio::test]
async fn test_empty_image_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new(Vec::new());
    let agent = orchestrator(test_config(&dir), backend.clone());

    agent
        .run_turn_headless(
            "Hello",
            &ConversationHistory::new(),
            Some(String::new()),
            Some("image/png".to_string()),
        )
        .await
        .unwrap();

    let messages = &backend.requests()[0].messages;
    assert_eq!(messages[0], Message::user("Hello"));
}

/// Async handler that panics inside its spawned task
struct Exploding;

#[async_trait]
impl ToolHandler for Exploding {
    async fn call(&self, _arguments: Value) -> Result<String> {
        panic!("kaboom")
    }
}

fn empty_schema(name: &str) -> ToolDefinition {
    ToolDefinition::new(name, "Always panics", json!({"type": "object", "properties": {}}))
}

#[tokio::test]
async fn test_panicking_handlers_are_reported_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let backend = ScriptedBackend::new(vec![
        Ok(ModelResponse::with_tools(
            None,
            vec![
                call("a", "boom", json!({})),
                call("b", "sync_boom", json!({})),
                call("c", "echo", json!({"text": "still here"})),
            ],
        )),
        Ok(ModelResponse::text("ok")),
    ]);

    let mut tools = ToolRegistry::new();
    tools
        .register(empty_schema("boom"), ToolCategory::Files, Arc::new(Exploding))
        .unwrap();
    tools
        .register_typed(
            empty_schema("sync_boom"),
            ToolCategory::Files,
            |_: Value| -> Result<String> { panic!("sync kaboom") },
        )
        .unwrap();
    tools
        .register_typed(empty_schema("echo"), ToolCategory::Notes, |args: Value| {
            Ok(args["text"].as_str().unwrap_or_default().to_string())
        })
        .unwrap();

    let research = Arc::new(
        ResearchAgent::new(backend.clone(), Arc::new(CountingSearch::default()), &config).unwrap(),
    );
    let agent = Orchestrator::with_registry(config, backend.clone(), tools, research);

    let (reply, history) = agent
        .run_turn_headless("Break things", &ConversationHistory::new(), None, None)
        .await
        .unwrap();
    assert_eq!(reply, "ok");
    assert_eq!(history.last().unwrap().content, "ok");

    let results = tool_results(backend.requests()[1].messages.last().unwrap());
    assert_eq!(results.len(), 3);
    assert!(results[0].starts_with("Error executing 'boom': "));
    assert!(results[0].contains("panicked"));
    assert!(results[1].starts_with("Error executing 'sync_boom': "));
    assert!(results[1].contains("panicked"));
    assert_eq!(results[2], "still here");
}

#[tokio::test]
async fn test_tool_request_without_calls_is_a_degraded_stop() {
    let dir = tempfile::tempdir().unwrap();
    let no_calls = || -> Result<ModelResponse> {
        Ok(ModelResponse {
            content: vec![ContentBlock::Thinking {
                thinking: "maybe a tool".to_string(),
                signature: String::new(),
            }],
            stop: StopCondition::ToolRequest,
        })
    };
    let backend = ScriptedBackend::new(vec![no_calls(), no_calls()]);
    let agent = orchestrator(test_config(&dir), backend.clone());
    let empty = ConversationHistory::new();

    let (reply, history) = agent
        .run_turn_observed("Do something", &empty, &SilentObserver)
        .await
        .unwrap();
    assert_eq!(reply, "");
    assert_eq!(history.last().unwrap().content, "(stopped unexpectedly)");

    let (_, history) = agent
        .run_turn_headless("Do something", &empty, None, None)
        .await
        .unwrap();
    assert_eq!(history.last().unwrap().content, "(stopped)");
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_complete_without_text_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let thinking_only = || -> Result<ModelResponse> {
        Ok(ModelResponse {
            content: vec![ContentBlock::Thinking {
                thinking: "nothing to say".to_string(),
                signature: "sig".to_string(),
            }],
            stop: StopCondition::Complete,
        })
    };
    let backend = ScriptedBackend::new(vec![thinking_only(), thinking_only()]);
    let agent = orchestrator(test_config(&dir), backend);
    let empty = ConversationHistory::new();

    let (reply, history) = agent
        .run_turn_observed("Hmm", &empty, &SilentObserver)
        .await
        .unwrap();
    assert_eq!(reply, "");
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().content, "(no text response)");

    let (_, history) = agent
        .run_turn_headless("Hmm", &empty, None, None)
        .await
        .unwrap();
    assert_eq!(history.last().unwrap().content, "(no response)");
}

/// Records every progress event in order
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl TurnObserver for RecordingObserver {
    fn on_thinking(&self) {
        self.events.lock().unwrap().push("thinking".to_string());
    }

    fn on_text(&self, text: &str) {
        self.events.lock().unwrap().push(format!("text: {}", text));
    }

    fn on_tool_call(&self, name: &str) {
        self.events.lock().unwrap().push(format!("call: {}", name));
    }

    fn on_tool_result(&self, name: &str, result: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("result: {}: {}", name, preview(result, 120)));
    }
}

#[tokio::test]
async fn test_observer_sees_progress_and_reasoning_is_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let long_text = "lorem ipsum ".repeat(30);
    let thinking = ContentBlock::Thinking {
        thinking: "write then read it back".to_string(),
        signature: "sig-1".to_string(),
    };

    let mut first = ModelResponse::with_tools(
        Some("Saving the file."),
        vec![
            call("w", "write_file", json!({"path": "notes/long.txt", "content": long_text})),
            call("r", "read_file", json!({"path": "notes/long.txt"})),
        ],
    );
    first.content.insert(0, thinking.clone());

    let backend = ScriptedBackend::new(vec![Ok(first), Ok(ModelResponse::text("Saved."))]);
    let agent = orchestrator(test_config(&dir), backend.clone());
    let observer = RecordingObserver::default();

    let (reply, _) = agent
        .run_turn_observed("Save a long note", &ConversationHistory::new(), &observer)
        .await
        .unwrap();
    assert_eq!(reply, "Saved.");

    let events = observer.events();
    assert_eq!(events[0], "thinking");
    assert_eq!(events[1], "text: Saving the file.");
    assert_eq!(events[2], "call: write_file");
    assert!(events[3].starts_with("result: write_file: File 'notes/long.txt' written"));
    assert_eq!(events[4], "call: read_file");
    let read_preview = events[5].trim_start_matches("result: read_file: ");
    assert_eq!(read_preview.chars().count(), 121);
    assert!(read_preview.ends_with('…'));
    assert!(!read_preview.contains('\n'));
    assert_eq!(events[6], "text: Saved.");
    assert_eq!(events.len(), 7);

    // The raw assistant message, reasoning included, goes back to the backend
    let replayed = &backend.requests()[1].messages[1];
    assert_eq!(replayed.role, Role::Assistant);
    match &replayed.content {
        MessageContent::Blocks(blocks) => {
            assert_eq!(blocks[0], thinking);
            assert_eq!(blocks[1], ContentBlock::text("Saving the file."));
            assert_eq!(blocks.len(), 4);
        }
        MessageContent::Text(_) => panic!("expected the raw assistant blocks"),
    }
}
