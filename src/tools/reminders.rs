//! Reminder tools
//!
//! Reminders live in `reminders.json` under the data directory. Due times
//! are kept as the string the model supplied and compared against local time.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{Result, ToolCategory, ToolDefinition};
use crate::tools::registry::ToolRegistry;
use crate::tools::store::{new_id, timestamp, JsonFile};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A stored reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub datetime: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl Reminder {
    fn due(&self) -> Option<NaiveDateTime> {
        parse_datetime(&self.datetime)
    }

    fn render(&self, lines: &mut Vec<String>) {
        lines.push(format!("  [{}] {} - {}", self.id, self.datetime, self.title));
        if !self.description.is_empty() {
            lines.push(format!("    {}", self.description));
        }
    }
}

/// Parse an ISO-8601 local datetime; a bare date means midnight
fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RemindersData {
    reminders: Vec<Reminder>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetReminderArgs {
    pub title: String,
    pub datetime_str: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRemindersArgs {
    #[serde(default = "default_include_overdue")]
    pub include_overdue: bool,
}

impl Default for CheckRemindersArgs {
    fn default() -> Self {
        Self {
            include_overdue: true,
        }
    }
}

fn default_include_overdue() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderIdArgs {
    pub reminder_id: String,
}

/// Reminders backed by a JSON file
pub struct Reminders {
    file: JsonFile<RemindersData>,
}

impl Reminders {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir, "reminders.json"),
        }
    }

    pub fn set(&self, args: SetReminderArgs) -> Result<String> {
        let mut data = self.file.load()?;
        let reminder = Reminder {
            id: new_id(),
            title: args.title,
            datetime: args.datetime_str,
            description: args.description.unwrap_or_default(),
            done: false,
            created_at: timestamp(),
            completed_at: None,
        };
        let reply = format!(
            "Reminder set: '{}' at {} (ID: {})",
            reminder.title, reminder.datetime, reminder.id
        );
        data.reminders.push(reminder);
        self.file.save(&data)?;
        Ok(reply)
    }

    /// Pending reminders relative to the current local time
    pub fn check(&self, args: CheckRemindersArgs) -> Result<String> {
        self.check_at(args, chrono::Local::now().naive_local())
    }

    /// Pending reminders relative to `now`; unparseable due times count as upcoming
    pub fn check_at(&self, args: CheckRemindersArgs, now: NaiveDateTime) -> Result<String> {
        let data = self.file.load()?;

        let (mut overdue, mut upcoming): (Vec<&Reminder>, Vec<&Reminder>) = data
            .reminders
            .iter()
            .filter(|r| !r.done)
            .partition(|r| matches!(r.due(), Some(due) if due < now));
        overdue.sort_by(|a, b| a.datetime.cmp(&b.datetime));
        upcoming.sort_by(|a, b| a.datetime.cmp(&b.datetime));

        let mut lines = Vec::new();
        if args.include_overdue && !overdue.is_empty() {
            lines.push("OVERDUE:".to_string());
            for r in &overdue {
                r.render(&mut lines);
            }
            lines.push(String::new());
        }
        if !upcoming.is_empty() {
            lines.push("UPCOMING:".to_string());
            for r in &upcoming {
                r.render(&mut lines);
            }
        }

        if lines.is_empty() {
            return Ok("No pending reminders.".to_string());
        }
        Ok(lines.join("\n"))
    }

    pub fn complete(&self, args: ReminderIdArgs) -> Result<String> {
        let mut data = self.file.load()?;

        let Some(reminder) = data
            .reminders
            .iter_mut()
            .find(|r| r.id == args.reminder_id)
        else {
            return Ok(format!("Reminder '{}' not found.", args.reminder_id));
        };

        reminder.done = true;
        reminder.completed_at = Some(timestamp());
        let reply = format!("Reminder '{}' marked as done.", reminder.title);
        self.file.save(&data)?;
        Ok(reply)
    }

    pub fn delete(&self, args: ReminderIdArgs) -> Result<String> {
        let mut data = self.file.load()?;
        let before = data.reminders.len();
        data.reminders.retain(|r| r.id != args.reminder_id);

        if data.reminders.len() == before {
            return Ok(format!("No reminder found with ID '{}'.", args.reminder_id));
        }
        self.file.save(&data)?;
        Ok(format!("Reminder {} deleted.", args.reminder_id))
    }
}

/// Register the reminder tools
pub fn register(registry: &mut ToolRegistry, data_dir: &Path) -> Result<()> {
    let reminders = Arc::new(Reminders::new(data_dir));

    let r = reminders.clone();
    registry.register_typed(
        ToolDefinition::new(
            "set_reminder",
            "Set a reminder for a specific date and time.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "datetime_str": {"type": "string", "description": "ISO format: YYYY-MM-DDTHH:MM"},
                    "description": {"type": "string"}
                },
                "required": ["title", "datetime_str"]
            }),
        ),
        ToolCategory::Reminders,
        move |args: SetReminderArgs| r.set(args),
    )?;

    let r = reminders.clone();
    registry.register_typed(
        ToolDefinition::new(
            "check_reminders",
            "Check upcoming and overdue reminders.",
            json!({
                "type": "object",
                "properties": {
                    "include_overdue": {"type": "boolean", "description": "Include overdue reminders (default true)"}
                }
            }),
        ),
        ToolCategory::Reminders,
        move |args: CheckRemindersArgs| r.check(args),
    )?;

    let r = reminders.clone();
    registry.register_typed(
        ToolDefinition::new(
            "complete_reminder",
            "Mark a reminder as done.",
            json!({
                "type": "object",
                "properties": {
                    "reminder_id": {"type": "string"}
                },
                "required": ["reminder_id"]
            }),
        ),
        ToolCategory::Reminders,
        move |args: ReminderIdArgs| r.complete(args),
    )?;

    let r = reminders;
    registry.register_typed(
        ToolDefinition::new(
            "delete_reminder",
            "Delete a reminder by ID.",
            json!({
                "type": "object",
                "properties": {
                    "reminder_id": {"type": "string"}
                },
                "required": ["reminder_id"]
            }),
        ),
        ToolCategory::Reminders,
        move |args: ReminderIdArgs| r.delete(args),
    )?;

    Ok(())
}
