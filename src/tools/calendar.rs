//! Calendar tools
//!
//! Events live in `calendar.json` under the data directory.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{AideError, Result, ToolCategory, ToolDefinition};
use crate::tools::registry::ToolRegistry;
use crate::tools::store::{new_id, timestamp, JsonFile};

const DEFAULT_DURATION_MINUTES: u32 = 60;

/// A calendar event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, 24h
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CalendarData {
    events: Vec<CalendarEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddEventArgs {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEventsArgs {
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventIdArgs {
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventArgs {
    pub event_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn check_date(date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AideError::tool(format!("Invalid date '{}': expected YYYY-MM-DD", date)))
}

/// Calendar backed by a JSON file
pub struct Calendar {
    file: JsonFile<CalendarData>,
}

impl Calendar {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir, "calendar.json"),
        }
    }

    pub fn add_event(&self, args: AddEventArgs) -> Result<String> {
        check_date(&args.date)?;
        let mut data = self.file.load()?;

        let event = CalendarEvent {
            id: new_id(),
            title: args.title,
            date: args.date,
            time: args.time,
            duration_minutes: Some(args.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)),
            description: args.description.unwrap_or_default(),
            created_at: timestamp(),
        };

        let time_str = event
            .time
            .as_deref()
            .map(|t| format!(" at {}", t))
            .unwrap_or_default();
        let reply = format!(
            "Added event '{}' on {}{} (ID: {})",
            event.title, event.date, time_str, event.id
        );

        data.events.push(event);
        self.file.save(&data)?;
        Ok(reply)
    }

    pub fn list_events(&self, args: ListEventsArgs) -> Result<String> {
        let data = self.file.load()?;

        let mut events: Vec<&CalendarEvent> = data
            .events
            .iter()
            .filter(|e| e.date.as_str() >= args.start_date.as_str())
            .filter(|e| match &args.end_date {
                Some(end) => e.date.as_str() <= end.as_str(),
                None => true,
            })
            .collect();
        events.sort_by(|a, b| {
            (a.date.as_str(), a.time.as_deref().unwrap_or(""))
                .cmp(&(b.date.as_str(), b.time.as_deref().unwrap_or("")))
        });

        if events.is_empty() {
            return Ok("No events found for the given date range.".to_string());
        }

        let lines: Vec<String> = events
            .into_iter()
            .map(|e| {
                let mut line = format!("[{}] {}", e.id, e.date);
                if let Some(time) = &e.time {
                    line.push_str(&format!(" {}", time));
                }
                line.push_str(&format!(" - {}", e.title));
                if let Some(minutes) = e.duration_minutes.filter(|m| *m > 0) {
                    line.push_str(&format!(" ({} min)", minutes));
                }
                if !e.description.is_empty() {
                    line.push_str(&format!("\n    {}", e.description));
                }
                line
            })
            .collect();
        Ok(lines.join("\n"))
    }

    pub fn delete_event(&self, args: EventIdArgs) -> Result<String> {
        let mut data = self.file.load()?;
        let before = data.events.len();
        data.events.retain(|e| e.id != args.event_id);

        if data.events.len() == before {
            return Ok(format!("No event found with ID '{}'.", args.event_id));
        }
        self.file.save(&data)?;
        Ok(format!("Event {} deleted.", args.event_id))
    }

    pub fn update_event(&self, args: UpdateEventArgs) -> Result<String> {
        if let Some(date) = args.date.as_deref().filter(|d| !d.is_empty()) {
            check_date(date)?;
        }
        let mut data = self.file.load()?;

        let Some(event) = data.events.iter_mut().find(|e| e.id == args.event_id) else {
            return Ok(format!("No event found with ID '{}'.", args.event_id));
        };

        if let Some(title) = args.title.filter(|t| !t.is_empty()) {
            event.title = title;
        }
        if let Some(date) = args.date.filter(|d| !d.is_empty()) {
            event.date = date;
        }
        if let Some(time) = args.time {
            event.time = Some(time);
        }
        if let Some(description) = args.description {
            event.description = description;
        }

        self.file.save(&data)?;
        Ok(format!("Event {} updated.", args.event_id))
    }
}

/// Register the calendar tools
pub fn register(registry: &mut ToolRegistry, data_dir: &Path) -> Result<()> {
    let calendar = Arc::new(Calendar::new(data_dir));

    let cal = calendar.clone();
    registry.register_typed(
        ToolDefinition::new(
            "add_calendar_event",
            "Add an event to the user's calendar.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "date": {"type": "string", "description": "Date in YYYY-MM-DD format"},
                    "time": {"type": "string", "description": "Time in HH:MM 24h format (optional)"},
                    "duration_minutes": {"type": "integer", "description": "Duration in minutes (default 60)"},
                    "description": {"type": "string"}
                },
                "required": ["title", "date"]
            }),
        ),
        ToolCategory::Calendar,
        move |args: AddEventArgs| cal.add_event(args),
    )?;

    let cal = calendar.clone();
    registry.register_typed(
        ToolDefinition::new(
            "list_calendar_events",
            "List calendar events for a date range.",
            json!({
                "type": "object",
                "properties": {
                    "start_date": {"type": "string", "description": "Start date YYYY-MM-DD"},
                    "end_date": {"type": "string", "description": "End date YYYY-MM-DD (optional)"}
                },
                "required": ["start_date"]
            }),
        ),
        ToolCategory::Calendar,
        move |args: ListEventsArgs| cal.list_events(args),
    )?;

    let cal = calendar.clone();
    registry.register_typed(
        ToolDefinition::new(
            "delete_calendar_event",
            "Delete a calendar event by its ID.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string", "description": "The event ID"}
                },
                "required": ["event_id"]
            }),
        ),
        ToolCategory::Calendar,
        move |args: EventIdArgs| cal.delete_event(args),
    )?;

    let cal = calendar;
    registry.register_typed(
        ToolDefinition::new(
            "update_calendar_event",
            "Update details of an existing calendar event.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "string"},
                    "title": {"type": "string"},
                    "date": {"type": "string"},
                    "time": {"type": "string"},
                    "description": {"type": "string"}
                },
                "required": ["event_id"]
            }),
        ),
        ToolCategory::Calendar,
        move |args: UpdateEventArgs| cal.update_event(args),
    )?;

    Ok(())
}
