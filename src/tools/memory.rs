//! Long-lived memory tools
//!
//! Key/value facts grouped by category, stored in `memory.json`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{Result, ToolCategory, ToolDefinition};
use crate::tools::registry::ToolRegistry;
use crate::tools::store::{timestamp, JsonFile};

const DEFAULT_CATEGORY: &str = "general";

/// One remembered value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub value: String,
    #[serde(default)]
    pub updated_at: String,
}

type Category = BTreeMap<String, MemoryEntry>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryData {
    memories: BTreeMap<String, Category>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RememberArgs {
    pub key: String,
    pub value: String,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecallArgs {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgetArgs {
    pub key: String,
    #[serde(default = "default_category")]
    pub category: String,
}

/// Memory store backed by a JSON file
pub struct Memory {
    file: JsonFile<MemoryData>,
}

impl Memory {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir, "memory.json"),
        }
    }

    pub fn remember(&self, args: RememberArgs) -> Result<String> {
        let mut data = self.file.load()?;
        data.memories.entry(args.category.clone()).or_default().insert(
            args.key.clone(),
            MemoryEntry {
                value: args.value.clone(),
                updated_at: timestamp(),
            },
        );
        self.file.save(&data)?;
        Ok(format!(
            "Remembered [{}] {}: {}",
            args.category, args.key, args.value
        ))
    }

    /// Read-only lookup; never writes the store
    pub fn recall(&self, args: RecallArgs) -> Result<String> {
        let data = self.file.load()?;
        let memories = &data.memories;

        if memories.is_empty() {
            return Ok("No memories stored yet.".to_string());
        }

        let key = args.key.filter(|k| !k.is_empty());
        let category = args.category.filter(|c| !c.is_empty());

        let reply = match (key, category) {
            (Some(key), Some(category)) => match memories.get(&category).and_then(|c| c.get(&key)) {
                Some(entry) => format!("[{}] {}: {}", category, key, entry.value),
                None => format!(
                    "No memory found for key '{}' in category '{}'.",
                    key, category
                ),
            },
            (Some(key), None) => {
                let found: Vec<String> = memories
                    .iter()
                    .filter_map(|(name, cat)| {
                        cat.get(&key)
                            .map(|entry| format!("[{}] {}: {}", name, key, entry.value))
                    })
                    .collect();
                if found.is_empty() {
                    format!("No memory found for key '{}'.", key)
                } else {
                    found.join("\n")
                }
            }
            (None, Some(category)) => match memories.get(&category).filter(|c| !c.is_empty()) {
                Some(cat) => {
                    let mut lines = vec![format!("Category: {}", category)];
                    lines.extend(cat.iter().map(|(k, v)| format!("  {}: {}", k, v.value)));
                    lines.join("\n")
                }
                None => format!("No memories in category '{}'.", category),
            },
            (None, None) => {
                let mut lines = Vec::new();
                for (name, cat) in memories {
                    lines.push(format!("[{}]", name));
                    lines.extend(cat.iter().map(|(k, v)| format!("  {}: {}", k, v.value)));
                }
                lines.join("\n")
            }
        };
        Ok(reply)
    }

    pub fn forget(&self, args: ForgetArgs) -> Result<String> {
        let mut data = self.file.load()?;

        let Some(cat) = data.memories.get_mut(&args.category) else {
            return Ok(not_found(&args));
        };
        if cat.remove(&args.key).is_none() {
            return Ok(not_found(&args));
        }
        if cat.is_empty() {
            data.memories.remove(&args.category);
        }

        self.file.save(&data)?;
        Ok(format!("Forgot [{}] {}.", args.category, args.key))
    }
}

fn not_found(args: &ForgetArgs) -> String {
    format!("No memory found for '{}' in '{}'.", args.key, args.category)
}

/// Register the memory tools
pub fn register(registry: &mut ToolRegistry, data_dir: &Path) -> Result<()> {
    let memory = Arc::new(Memory::new(data_dir));

    let m = memory.clone();
    registry.register_typed(
        ToolDefinition::new(
            "remember",
            "Persist information across conversations (user preferences, important facts, contacts, etc.).",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Unique key for this memory"},
                    "value": {"type": "string", "description": "The value to store"},
                    "category": {"type": "string", "description": "Category such as 'preferences', 'contacts', 'facts'"}
                },
                "required": ["key", "value"]
            }),
        ),
        ToolCategory::Memory,
        move |args: RememberArgs| m.remember(args),
    )?;

    let m = memory.clone();
    registry.register_typed(
        ToolDefinition::new(
            "recall",
            "Retrieve stored memories. Provide key and/or category to filter, or omit both to list all memories.",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string"},
                    "category": {"type": "string"}
                }
            }),
        ),
        ToolCategory::Memory,
        move |args: RecallArgs| m.recall(args),
    )?;

    let m = memory;
    registry.register_typed(
        ToolDefinition::new(
            "forget",
            "Remove a stored memory by key and category.",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string"},
                    "category": {"type": "string", "description": "Category (default 'general')"}
                },
                "required": ["key"]
            }),
        ),
        ToolCategory::Memory,
        move |args: ForgetArgs| m.forget(args),
    )?;

    Ok(())
}
