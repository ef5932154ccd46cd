//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.
//! The registry is built once at startup; dispatch never fails, every
//! outcome is turned into the text the model receives.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{AideError, Result, ToolCategory, ToolDefinition};

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool on raw JSON arguments
    async fn call(&self, arguments: Value) -> Result<String>;
}

/// Decode tool arguments into a typed struct
///
/// Missing required fields, wrong types and unknown fields all surface as
/// argument errors.
pub fn parse_args<A: DeserializeOwned>(arguments: Value) -> Result<A> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| AideError::arguments(e.to_string()))
}

/// Adapter from a synchronous typed function to a [`ToolHandler`]
///
/// The function runs on the blocking pool, since the built-in tools do
/// file I/O.
pub struct TypedTool<A, F> {
    handler: Arc<F>,
    _args: PhantomData<fn(A)>,
}

impl<A, F> TypedTool<A, F>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Result<String> + Send + Sync + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler: Arc::new(handler),
            _args: PhantomData,
        }
    }
}

#[async_trait]
impl<A, F> ToolHandler for TypedTool<A, F>
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(A) -> Result<String> + Send + Sync + 'static,
{
    async fn call(&self, arguments: Value) -> Result<String> {
        let args = parse_args::<A>(arguments)?;
        let handler = self.handler.clone();
        tokio::task::spawn_blocking(move || handler(args))
            .await
            .map_err(|e| AideError::tool(e.to_string()))?
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    category: ToolCategory,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of available tools
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, so the model always sees the same tool list
    order: Vec<String>,
    /// Whether tools that run another agent loop may be registered
    allow_delegation: bool,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create an empty top-level registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            allow_delegation: true,
        }
    }

    /// Create an empty registry for a nested agent; it refuses delegation tools
    pub fn nested() -> Self {
        Self {
            allow_delegation: false,
            ..Self::new()
        }
    }

    /// Register a tool handler
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        category: ToolCategory,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        let name = definition.name.clone();

        if self.tools.contains_key(&name) {
            return Err(AideError::registration(format!(
                "tool '{}' is already registered",
                name
            )));
        }

        if category == ToolCategory::Delegation && !self.allow_delegation {
            return Err(AideError::registration(format!(
                "delegation tool '{}' cannot be registered in a nested agent",
                name
            )));
        }

        self.order.push(name.clone());
        self.tools.insert(
            name,
            RegisteredTool {
                definition,
                category,
                handler,
            },
        );
        Ok(())
    }

    /// Register a synchronous tool with typed arguments
    pub fn register_typed<A, F>(
        &mut self,
        definition: ToolDefinition,
        category: ToolCategory,
        handler: F,
    ) -> Result<()>
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(A) -> Result<String> + Send + Sync + 'static,
    {
        self.register(definition, category, Arc::new(TypedTool::new(handler)))
    }

    /// Get all tool definitions, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Get tool names by category
    pub fn names_by_category(&self, category: ToolCategory) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| self.tools.get(*name).map(|t| t.category) == Some(category))
            .map(|name| name.as_str())
            .collect()
    }

    /// Category of a registered tool
    pub fn category(&self, name: &str) -> Option<ToolCategory> {
        self.tools.get(name).map(|t| t.category)
    }

    /// Check whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call; failures become text, never errors
    pub async fn dispatch(&self, name: &str, arguments: Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            log::warn!("Model requested unknown tool: {}", name);
            return unknown_tool(name);
        };

        match tool.handler.call(arguments).await {
            Ok(output) => output,
            Err(e) if e.is_argument_error() => {
                log::debug!("Argument mismatch for {}: {}", name, e);
                format!("Tool call error for '{}': {}", name, e)
            }
            Err(e) => {
                log::debug!("Tool {} failed: {}", name, e);
                execution_error(name, e)
            }
        }
    }
}

/// Result text for a name no registry knows
pub fn unknown_tool(name: &str) -> String {
    format!("Unknown tool: {}", name)
}

/// Result text for a handler failure
pub fn execution_error(name: &str, error: impl std::fmt::Display) -> String {
    format!("Error executing '{}': {}", name, error)
}
