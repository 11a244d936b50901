use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AdmError, Result};

/// Format used for `Task::due_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used for `Task::due_time` (`09:00 AM`).
pub const DUE_TIME_FORMAT: &str = "%I:%M %p";
/// Format used for `JournalEntry::date`.
pub const JOURNAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Stable identifier of a task, generated once and persisted with it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form shown in listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Whether `prefix` is a (case-insensitive) prefix of the id.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase().replace('-', "");
        !prefix.is_empty() && self.0.simple().to_string().starts_with(&prefix)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A single to-do item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    #[serde(default)]
    pub id: TaskId,
    /// The text shown next to the checkbox.
    pub name: String,
    /// `true` while the task is not yet done.
    #[serde(default = "default_pending")]
    pub pending: bool,
    /// Kept for file compatibility; nothing reads it.
    #[serde(default)]
    pub priority: i32,
    /// `YYYY-MM-DD` or empty.
    #[serde(default)]
    pub due_date: String,
    /// `hh:mm AM/PM` or empty. Ignored when `due_date` is empty.
    #[serde(default)]
    pub due_time: String,
    #[serde(default)]
    pub is_important: bool,
    /// Set at construction; the sort key inside each importance group.
    #[serde(default = "now_local")]
    pub added_date_time: NaiveDateTime,
}

fn default_pending() -> bool {
    true
}

impl Task {
    /// Creates a pending task with no due date.
    ///
    /// Fails with [`AdmError::EmptyName`] when `name` is blank.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AdmError::EmptyName);
        }
        Ok(Self {
            id: TaskId::new(),
            name,
            pending: true,
            priority: 0,
            due_date: String::new(),
            due_time: String::new(),
            is_important: false,
            added_date_time: now_local(),
        })
    }

    pub fn with_due(mut self, date: impl Into<String>, time: impl Into<String>) -> Self {
        self.due_date = date.into();
        self.due_time = time.into();
        self
    }

    pub fn with_pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    /// Resolves the due fields into a local timestamp.
    ///
    /// Returns `Ok(None)` when either field is empty, since a reminder needs both.
    pub fn due_timestamp(&self) -> Result<Option<NaiveDateTime>> {
        let date = self.due_date.trim();
        let time = self.due_time.trim();
        if date.is_empty() || time.is_empty() {
            return Ok(None);
        }
        let malformed = || AdmError::MalformedDueDate {
            date: self.due_date.clone(),
            time: self.due_time.clone(),
        };
        let day = NaiveDate::parse_from_str(date, DUE_DATE_FORMAT).map_err(|_| malformed())?;
        let upper = time.to_uppercase();
        let clock = NaiveTime::parse_from_str(&upper, DUE_TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&upper, "%H:%M"))
            .map_err(|_| malformed())?;
        Ok(Some(day.and_time(clock)))
    }

    /// `due_date due_time` as shown next to the task, or empty.
    pub fn due_label(&self) -> String {
        if self.due_date.is_empty() {
            return String::new();
        }
        format!("{} {}", self.due_date, self.due_time).trim_end().to_string()
    }
}

/// One journal entry, stored as a single JSON line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JournalEntry {
    #[serde(alias = "name")]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub quote: String,
    /// `YYYY-MM-DD HH:MM`, sortable as text.
    pub date: String,
}

impl JournalEntry {
    /// Creates an entry stamped with the current local time.
    pub fn new(title: impl Into<String>, content: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            quote: quote.into(),
            date: Local::now().format(JOURNAL_DATE_FORMAT).to_string(),
        }
    }
}

/// A headline returned by the news API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, rename = "urlToImage")]
    pub url_to_image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(Task::new("   "), Err(AdmError::EmptyName)));
    }

    #[test]
    fn due_timestamp_parses_twelve_hour_clock() {
        let task = Task::new("Call").unwrap().with_due("2025-01-01", "09:00 AM");
        let ts = task.due_timestamp().unwrap().unwrap();
        assert_eq!(ts.to_string(), "2025-01-01 09:00:00");

        let lower = Task::new("Call").unwrap().with_due("2025-01-01", "09:30 pm");
        assert_eq!(lower.due_timestamp().unwrap().unwrap().to_string(), "2025-01-01 21:30:00");
    }

    #[test]
    fn due_timestamp_needs_both_fields() {
        let date_only = Task::new("Call").unwrap().with_due("2025-01-01", "");
        assert_eq!(date_only.due_timestamp().unwrap(), None);
        let time_only = Task::new("Call").unwrap().with_due("", "09:00 AM");
        assert_eq!(time_only.due_timestamp().unwrap(), None);
    }

    #[test]
    fn due_timestamp_reports_garbage() {
        let task = Task::new("Call").unwrap().with_due("next tuesday", "9ish");
        assert!(matches!(task.due_timestamp(), Err(AdmError::MalformedDueDate { .. })));
    }

    #[test]
    fn legacy_record_without_id_loads() {
        let line = r#"{"name":"Old","pending":false,"priority":0,"due_date":"","due_time":"","is_important":true}"#;
        let task: Task = serde_json::from_str(line).unwrap();
        assert_eq!(task.name, "Old");
        assert!(!task.pending);
        assert!(task.is_important);
    }

    #[test]
    fn journal_entry_accepts_name_alias() {
        let line = r#"{"name":"Day one","content":"hello","quote":"","date":"2024-05-01 10:00"}"#;
        let entry: JournalEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.title, "Day one");
    }
}
