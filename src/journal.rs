//! Journal entries: append-only on save, full rewrite on delete.

use std::path::Path;

use crate::error::Result;
use crate::models::JournalEntry;
use crate::storage::{append_record, load_records, save_records};

/// Characters of content shown in list previews.
pub const MAX_CONTENT_LENGTH: usize = 20;

pub fn save_entry(path: &Path, entry: &JournalEntry) -> Result<()> {
    append_record(path, entry)
}

/// Loads every entry, newest first.
pub fn load_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let mut entries = load_records(path)?;
    sort_entries(&mut entries, true);
    Ok(entries)
}

/// Sorts by date; `newest_first` puts the latest entry on top.
pub fn sort_entries(entries: &mut [JournalEntry], newest_first: bool) {
    if newest_first {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
    } else {
        entries.sort_by(|a, b| a.date.cmp(&b.date));
    }
}

fn squash(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

/// Entries whose date, title or content contains `query`, ignoring case
/// and whitespace.
pub fn filter_entries<'a>(entries: &'a [JournalEntry], query: &str) -> Vec<&'a JournalEntry> {
    let query = squash(query);
    entries
        .iter()
        .filter(|e| {
            squash(&e.date).contains(&query)
                || squash(&e.title).contains(&query)
                || squash(&e.content).contains(&query)
        })
        .collect()
}

/// Removes the first entry titled `title` and rewrites the file.
///
/// Returns `false` (and leaves the file alone) when nothing matched.
pub fn delete_entry(path: &Path, title: &str) -> Result<bool> {
    let mut entries: Vec<JournalEntry> = load_records(path)?;
    let Some(i) = entries.iter().position(|e| e.title == title) else {
        log::warn!("Journal entry '{}' not found", title);
        return Ok(false);
    };
    entries.remove(i);
    save_records(path, &entries)?;
    Ok(true)
}

/// Content cut to [`MAX_CONTENT_LENGTH`] characters, with `...` when cut.
pub fn preview(content: &str) -> String {
    if content.chars().count() > MAX_CONTENT_LENGTH {
        let head: String = content.chars().take(MAX_CONTENT_LENGTH).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
