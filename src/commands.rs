use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use chrono::Local;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::app::AppState;
use crate::config::Config;
use crate::journal;
use crate::models::{JournalEntry, Task, TaskId};
use crate::news::NewsClient;
use crate::notify::FallbackSink;
use crate::store::TaskStore;

/// How often `watch` looks for edits made by other commands.
const WATCH_RELOAD_INTERVAL: Duration = Duration::from_secs(15);

fn open_state(silent: bool) -> Option<AppState> {
    let loaded = Config::load().and_then(AppState::load);
    match loaded {
        Ok(state) => Some(state),
        Err(e) => {
            log::error!("{}", e);
            if !silent { eprintln!("Failed to load tasks: {}", e); }
            None
        }
    }
}

fn save_state(state: &AppState, silent: bool) -> bool {
    match state.save() {
        Ok(()) => true,
        Err(e) => {
            log::error!("{}", e);
            if !silent { eprintln!("Failed to save tasks: {}", e); }
            false
        }
    }
}

fn resolve(store: &TaskStore, selector: &str, silent: bool) -> Option<TaskId> {
    let id = store.resolve(selector);
    if id.is_none() && !silent {
        eprintln!("Task '{}' not found.", selector);
    }
    id
}

/// Adds a new task to the to-do list.
///
/// No format check is done on the due fields here; a bad date only means
/// no reminders will be registered for it.
pub fn cmd_add(name: String, due_date: Option<String>, due_time: Option<String>, important: bool, silent: bool) {
    let task = match Task::new(name) {
        Ok(t) => t.with_due(due_date.unwrap_or_default(), due_time.unwrap_or_default()),
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    if let Err(e) = task.due_timestamp() {
        log::warn!("{}", e);
        if !silent { eprintln!("Warning: {}; no reminders will fire.", e); }
    }
    let Some(mut state) = open_state(silent) else { return };
    let id = state.add_task(task);
    if important {
        if let Err(e) = state.active.set_important(id, true) {
            log::error!("{}", e);
        }
    }
    if save_state(&state, silent) && !silent {
        println!("Task added (id = {})", id.short());
    }
}

/// Lists the to-do list (or the history) in display order.
pub fn cmd_list(history: bool) {
    let Some(state) = open_state(false) else { return };
    let store = if history { &state.history } else { &state.active };
    if store.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("★").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let now = Local::now().naive_local();
    for (i, t) in store.iter().enumerate() {
        let due_color = match t.due_timestamp() {
            Ok(Some(due)) if due < now && t.pending => Color::Red,
            Err(_) => Color::Yellow,
            _ => Color::Reset,
        };
        let status = if t.pending { "Pending" } else { "Done" };
        let status_color = if t.pending { Color::Yellow } else { Color::Green };

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(t.id.short()),
            Cell::new(&t.name),
            Cell::new(t.due_label()).fg(due_color),
            Cell::new(if t.is_important { "★" } else { "" }).fg(Color::Yellow),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
}

/// Ticks a task's checkbox, moving it between the to-do list and the history.
pub fn cmd_check(selector: String, from_history: bool, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    let store = if from_history { &state.history } else { &state.active };
    let Some(id) = resolve(store, &selector, silent) else { return };
    match state.check(id) {
        Ok(to_history) => {
            if save_state(&state, silent) && !silent {
                if to_history {
                    println!("Task {} moved to history.", id.short());
                } else {
                    println!("Task {} moved back to the list.", id.short());
                }
            }
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
        }
    }
}

/// Stars (or un-stars) a task; the list is re-sorted afterwards.
pub fn cmd_star(selector: String, unstar: bool, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    let Some(id) = resolve(&state.active, &selector, silent) else { return };
    if let Err(e) = state.active.set_important(id, !unstar) {
        if !silent { eprintln!("{}", e); }
        return;
    }
    if save_state(&state, silent) && !silent {
        println!("Task {} {}.", id.short(), if unstar { "unstarred" } else { "starred" });
    }
}

pub fn cmd_rename(selector: String, name: String, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    let Some(id) = resolve(&state.active, &selector, silent) else { return };
    if let Err(e) = state.active.rename(id, name) {
        if !silent { eprintln!("{}", e); }
        return;
    }
    if save_state(&state, silent) && !silent {
        println!("Task {} renamed.", id.short());
    }
}

/// Changes the due date/time. Empty strings clear them.
pub fn cmd_due(selector: String, date: String, time: Option<String>, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    let Some(id) = resolve(&state.active, &selector, silent) else { return };
    if let Err(e) = state.active.set_due_date(id, date, time.unwrap_or_default()) {
        if !silent { eprintln!("{}", e); }
        return;
    }
    if save_state(&state, silent) && !silent {
        println!("Task {} updated.", id.short());
    }
}

/// Deletes a task from the to-do list (or the history).
pub fn cmd_remove(selector: String, from_history: bool, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    let store = if from_history { &state.history } else { &state.active };
    let Some(id) = resolve(store, &selector, silent) else { return };
    if state.delete(id).is_some() && save_state(&state, silent) && !silent {
        println!("Task {} removed.", id.short());
    }
}

/// Drag-and-drop equivalent: moves the task at position `from` to `to` (1-based).
pub fn cmd_move(from: usize, to: usize, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    if from == 0 || to == 0 || !state.active.move_item(from - 1, to - 1) {
        if !silent { eprintln!("Positions must be between 1 and {}.", state.active.len()); }
        return;
    }
    if save_state(&state, silent) && !silent {
        println!("Moved task {} to position {}.", from, to);
    }
}

/// Sorts starred tasks first, then by creation time.
pub fn cmd_sort(reverse: bool, silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    state.active.sort(reverse);
    if save_state(&state, silent) && !silent {
        println!("Tasks sorted ({}).", if reverse { "newest first" } else { "oldest first" });
    }
}

pub fn cmd_snapshot_save(silent: bool) {
    let Some(state) = open_state(silent) else { return };
    match state.save_snapshot() {
        Ok(()) => {
            if !silent { println!("Saved {} tasks to {}", state.active.len(), state.config.snapshot_path().display()); }
        }
        Err(e) => {
            log::error!("{}", e);
            if !silent { eprintln!("Failed to save snapshot: {}", e); }
        }
    }
}

pub fn cmd_snapshot_restore(silent: bool) {
    let Some(mut state) = open_state(silent) else { return };
    match state.restore_snapshot() {
        Ok(n) => {
            if save_state(&state, silent) && !silent {
                println!("Restored {} tasks.", n);
            }
        }
        Err(e) => {
            log::error!("{}", e);
            if !silent { eprintln!("Failed to restore snapshot: {}", e); }
        }
    }
}

fn modified(state: &AppState) -> Option<SystemTime> {
    fs::metadata(state.config.tasks_path()).and_then(|m| m.modified()).ok()
}

/// Runs the reminder loop in the foreground until interrupted.
///
/// Picks up tasks other commands add to or remove from the task file. Tasks
/// already watched keep their reminders when their due date is edited.
pub fn cmd_watch() {
    let Some(mut state) = open_state(false) else { return };
    state.start_reminders(Arc::new(FallbackSink::default()));
    let pending = state.scheduler().map(|s| s.handle().pending().len()).unwrap_or(0);
    println!("Watching {} tasks, {} reminders pending. Press Ctrl-C to stop.", state.active.len(), pending);

    let mut last_seen = modified(&state);
    loop {
        thread::sleep(WATCH_RELOAD_INTERVAL);
        let current = modified(&state);
        if current == last_seen {
            continue;
        }
        last_seen = current;
        match state.reload_active() {
            Ok(n) => log::info!("Task file changed, reloaded {} tasks", n),
            Err(e) => log::error!("Reloading tasks: {}", e),
        }
    }
}

pub fn cmd_journal_add(title: String, content: String, quote: Option<String>, silent: bool) {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let entry = JournalEntry::new(title, content, quote.unwrap_or_default());
    match journal::save_entry(&config.journal_path(), &entry) {
        Ok(()) => {
            if !silent { println!("Journal entry '{}' saved.", entry.title); }
        }
        Err(e) => {
            log::error!("An error occurred while saving the journal entry: {}", e);
            if !silent { eprintln!("Failed to save journal entry: {}", e); }
        }
    }
}

fn print_entries(entries: &[&JournalEntry]) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Title", "Content", "What I Learned Today"]);
    for e in entries {
        table.add_row(vec![
            e.date.clone(),
            e.title.clone(),
            journal::preview(&e.content),
            e.quote.clone(),
        ]);
    }
    println!("{table}");
}

fn load_journal() -> Option<Vec<JournalEntry>> {
    let loaded = Config::load().and_then(|c| journal::load_entries(&c.journal_path()));
    match loaded {
        Ok(entries) => Some(entries),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Failed to load journal: {}", e);
            None
        }
    }
}

pub fn cmd_journal_list(oldest_first: bool) {
    let Some(mut entries) = load_journal() else { return };
    journal::sort_entries(&mut entries, !oldest_first);
    print_entries(&entries.iter().collect::<Vec<_>>());
}

pub fn cmd_journal_search(query: String) {
    let Some(entries) = load_journal() else { return };
    print_entries(&journal::filter_entries(&entries, &query));
}

pub fn cmd_journal_remove(title: String, silent: bool) {
    let removed = Config::load().and_then(|c| journal::delete_entry(&c.journal_path(), &title));
    match removed {
        Ok(true) => {
            if !silent { println!("Journal entry '{}' removed.", title); }
        }
        Ok(false) => {
            if !silent { eprintln!("Journal entry '{}' not found.", title); }
        }
        Err(e) => {
            log::error!("{}", e);
            if !silent { eprintln!("Failed to remove journal entry: {}", e); }
        }
    }
}

/// Prints headlines for a category, optionally caching their images.
pub fn cmd_news(category: String, images: bool) {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let Some(key) = config.news_api_key.clone() else {
        eprintln!("No news API key. Set NEWS_API_KEY or add news_api_key to config.json.");
        return;
    };
    let client = match NewsClient::new(key, config.news_language.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let response = client.get_news(&category);
    if response.articles.is_empty() {
        println!("No headlines found.");
        return;
    }
    for (i, a) in response.articles.iter().enumerate() {
        println!("{}. {}", i + 1, a.title);
        if let Some(desc) = &a.description {
            println!("   {}", desc);
        }
        println!("   {}", a.url);
    }
    if images {
        let saved = client.cache_images(&response.articles, &config.image_cache_dir());
        println!("Cached {} images in {}", saved.len(), config.image_cache_dir().display());
    }
}
