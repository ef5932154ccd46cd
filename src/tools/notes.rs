//! Note-taking tools
//!
//! Notes live in `notes.json` under the data directory.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{Result, ToolCategory, ToolDefinition};
use crate::tools::registry::ToolRegistry;
use crate::tools::store::{new_id, timestamp, JsonFile};

const PREVIEW_CHARS: usize = 80;

/// A stored note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Note {
    fn created_day(&self) -> &str {
        self.created_at.get(..10).unwrap_or(&self.created_at)
    }

    fn tags_suffix(&self) -> String {
        if self.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", self.tags.join(", "))
        }
    }

    fn preview(&self) -> String {
        let mut preview: String = self
            .content
            .chars()
            .take(PREVIEW_CHARS)
            .collect::<String>()
            .replace('\n', " ");
        if self.content.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NotesData {
    notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteArgs {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListNotesArgs {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadNoteArgs {
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteArgs {
    pub note_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteIdArgs {
    pub note_id: String,
}

/// Notes backed by a JSON file
pub struct Notes {
    file: JsonFile<NotesData>,
}

impl Notes {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir, "notes.json"),
        }
    }

    pub fn create(&self, args: CreateNoteArgs) -> Result<String> {
        let mut data = self.file.load()?;
        let now = timestamp();
        let note = Note {
            id: new_id(),
            title: args.title,
            content: args.content,
            tags: args.tags.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };
        let reply = format!("Note created: '{}' (ID: {})", note.title, note.id);
        data.notes.push(note);
        self.file.save(&data)?;
        Ok(reply)
    }

    pub fn list(&self, args: ListNotesArgs) -> Result<String> {
        let data = self.file.load()?;
        let tag = args.tag.filter(|t| !t.is_empty()).map(|t| t.to_lowercase());
        let query = args
            .search
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());

        let notes: Vec<&Note> = data
            .notes
            .iter()
            .filter(|n| match &tag {
                Some(tag) => n.tags.iter().any(|t| t.to_lowercase() == *tag),
                None => true,
            })
            .filter(|n| match &query {
                Some(q) => {
                    n.title.to_lowercase().contains(q.as_str())
                        || n.content.to_lowercase().contains(q.as_str())
                }
                None => true,
            })
            .collect();

        if notes.is_empty() {
            return Ok("No notes found.".to_string());
        }

        let mut lines = Vec::new();
        for note in notes {
            lines.push(format!("[{}] {}{}", note.id, note.title, note.tags_suffix()));
            lines.push(format!("    Created: {}", note.created_day()));
            lines.push(format!("    {}", note.preview()));
            lines.push(String::new());
        }
        Ok(lines.join("\n"))
    }

    pub fn read(&self, args: ReadNoteArgs) -> Result<String> {
        let data = self.file.load()?;

        let note = match (args.note_id.filter(|s| !s.is_empty()), args.title) {
            (Some(id), _) => data.notes.iter().find(|n| n.id == id),
            (None, Some(title)) if !title.is_empty() => {
                let title = title.to_lowercase();
                data.notes.iter().find(|n| n.title.to_lowercase() == title)
            }
            _ => None,
        };

        let Some(note) = note else {
            return Ok("Note not found.".to_string());
        };

        let tags = if note.tags.is_empty() {
            String::new()
        } else {
            format!("\nTags: {}", note.tags.join(", "))
        };
        Ok(format!(
            "Title: {}\nID: {}{}\nCreated: {}\n---\n{}",
            note.title,
            note.id,
            tags,
            note.created_day(),
            note.content
        ))
    }

    pub fn update(&self, args: UpdateNoteArgs) -> Result<String> {
        let mut data = self.file.load()?;

        let Some(note) = data.notes.iter_mut().find(|n| n.id == args.note_id) else {
            return Ok(format!("Note '{}' not found.", args.note_id));
        };

        if let Some(title) = args.title.filter(|t| !t.is_empty()) {
            note.title = title;
        }
        if let Some(content) = args.content {
            note.content = content;
        }
        if let Some(tags) = args.tags {
            note.tags = tags;
        }
        note.updated_at = timestamp();

        self.file.save(&data)?;
        Ok(format!("Note {} updated.", args.note_id))
    }

    pub fn delete(&self, args: NoteIdArgs) -> Result<String> {
        let mut data = self.file.load()?;
        let before = data.notes.len();
        data.notes.retain(|n| n.id != args.note_id);

        if data.notes.len() == before {
            return Ok(format!("No note found with ID '{}'.", args.note_id));
        }
        self.file.save(&data)?;
        Ok(format!("Note {} deleted.", args.note_id))
    }
}

/// Register the note tools
pub fn register(registry: &mut ToolRegistry, data_dir: &Path) -> Result<()> {
    let notes = Arc::new(Notes::new(data_dir));

    let n = notes.clone();
    registry.register_typed(
        ToolDefinition::new(
            "create_note",
            "Create a new note with a title, content, and optional tags.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "content": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}, "description": "Optional tags"}
                },
                "required": ["title", "content"]
            }),
        ),
        ToolCategory::Notes,
        move |args: CreateNoteArgs| n.create(args),
    )?;

    let n = notes.clone();
    registry.register_typed(
        ToolDefinition::new(
            "list_notes",
            "List notes, optionally filtered by tag or keyword search.",
            json!({
                "type": "object",
                "properties": {
                    "search": {"type": "string", "description": "Keyword to search in title/content"},
                    "tag": {"type": "string", "description": "Filter by tag"}
                }
            }),
        ),
        ToolCategory::Notes,
        move |args: ListNotesArgs| n.list(args),
    )?;

    let n = notes.clone();
    registry.register_typed(
        ToolDefinition::new(
            "read_note",
            "Read the full content of a note by ID or title.",
            json!({
                "type": "object",
                "properties": {
                    "note_id": {"type": "string"},
                    "title": {"type": "string"}
                }
            }),
        ),
        ToolCategory::Notes,
        move |args: ReadNoteArgs| n.read(args),
    )?;

    let n = notes.clone();
    registry.register_typed(
        ToolDefinition::new(
            "update_note",
            "Update an existing note's title, content, or tags.",
            json!({
                "type": "object",
                "properties": {
                    "note_id": {"type": "string"},
                    "title": {"type": "string"},
                    "content": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["note_id"]
            }),
        ),
        ToolCategory::Notes,
        move |args: UpdateNoteArgs| n.update(args),
    )?;

    let n = notes;
    registry.register_typed(
        ToolDefinition::new(
            "delete_note",
            "Delete a note by ID.",
            json!({
                "type": "object",
                "properties": {
                    "note_id": {"type": "string"}
                },
                "required": ["note_id"]
            }),
        ),
        ToolCategory::Notes,
        move |args: NoteIdArgs| n.delete(args),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(notes: &Notes, title: &str, content: &str, tags: &[&str]) -> String {
        let reply = notes
            .create(CreateNoteArgs {
                title: title.to_string(),
                content: content.to_string(),
                tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            })
            .unwrap();
        let start = reply.rfind("(ID: ").unwrap() + 5;
        reply[start..start + 8].to_string()
    }

    #[test]
    fn test_filters_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let notes = Notes::new(dir.path());
        create(&notes, "Groceries", "Milk and eggs", &["Home"]);
        create(&notes, "Standup", "Discuss the release", &["work"]);

        let by_tag = notes
            .list(ListNotesArgs {
                tag: Some("home".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(by_tag.contains("Groceries [Home]"));
        assert!(!by_tag.contains("Standup"));

        let by_search = notes
            .list(ListNotesArgs {
                search: Some("RELEASE".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(by_search.contains("Standup"));

        let none = notes
            .list(ListNotesArgs {
                search: Some("nothing".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(none, "No notes found.");
    }

    #[test]
    fn test_preview_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let notes = Notes::new(dir.path());
        create(&notes, "Long", &"word ".repeat(40), &[]);
        let listed = notes.list(ListNotesArgs::default()).unwrap();
        assert!(listed.contains("..."));
    }

    #[test]
    fn test_read_by_title_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let notes = Notes::new(dir.path());
        let id = create(&notes, "Ideas", "Build a boat", &[]);

        let read = notes
            .read(ReadNoteArgs {
                note_id: None,
                title: Some("ideas".to_string()),
            })
            .unwrap();
        assert!(read.starts_with("Title: Ideas\nID: "));
        assert!(read.ends_with("---\nBuild a boat"));

        let updated = notes
            .update(UpdateNoteArgs {
                note_id: id.clone(),
                title: None,
                content: Some("Build a bigger boat".to_string()),
                tags: None,
            })
            .unwrap();
        assert_eq!(updated, format!("Note {} updated.", id));

        let missing = notes
            .update(UpdateNoteArgs {
                note_id: "ffffffff".to_string(),
                title: None,
                content: None,
                tags: None,
            })
            .unwrap();
        assert_eq!(missing, "Note 'ffffffff' not found.");
    }

    #[test]
    fn test_read_without_selector_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let notes = Notes::new(dir.path());
        let id = create(&notes, "Temp", "x", &[]);

        assert_eq!(notes.read(ReadNoteArgs::default()).unwrap(), "Note not found.");
        assert_eq!(
            notes.delete(NoteIdArgs { note_id: id.clone() }).unwrap(),
            format!("Note {} deleted.", id)
        );
        assert_eq!(
            notes.delete(NoteIdArgs { note_id: id.clone() }).unwrap(),
            format!("No note found with ID '{}'.", id)
        );
    }
}
