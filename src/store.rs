use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::error::{AdmError, Result};
use crate::models::{Task, TaskId};
use crate::scheduler::SchedulerHandle;
use crate::storage;

/// Shortest id prefix accepted by [`TaskStore::resolve`].
pub const MIN_ID_PREFIX: usize = 4;

/// An ordered list of tasks as the user sees it.
///
/// Insertion order is kept until [`sort`](Self::sort) is called explicitly.
/// When a scheduler is attached, adding a task registers its reminders and
/// removing it cancels them.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    scheduler: Option<SchedulerHandle>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already-loaded tasks, keeping their order.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks, scheduler: None }
    }

    /// Connects the store to a scheduler and registers reminders for the
    /// tasks it already holds.
    pub fn attach_scheduler(&mut self, handle: SchedulerHandle, now: NaiveDateTime) {
        for t in &self.tasks {
            handle.schedule_task(t, now);
        }
        self.scheduler = Some(handle);
    }

    /// Connects the store to a scheduler without registering anything.
    pub fn set_scheduler(&mut self, handle: SchedulerHandle) {
        self.scheduler = Some(handle);
    }

    pub fn scheduler(&self) -> Option<&SchedulerHandle> {
        self.scheduler.as_ref()
    }

    /// Appends a task and registers its reminders.
    pub fn add(&mut self, task: Task) -> TaskId {
        self.add_at(task, Local::now().naive_local())
    }

    /// Same as [`add`](Self::add) with an explicit notion of "now".
    pub fn add_at(&mut self, task: Task, now: NaiveDateTime) -> TaskId {
        let id = task.id;
        if let Some(handle) = &self.scheduler {
            handle.schedule_task(&task, now);
        }
        log::info!("{} is added", task.name);
        self.tasks.push(task);
        id
    }

    /// Removes the task with this id and cancels its pending reminders.
    ///
    /// Returns `None` (and logs) when no such task is in the list.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let Some(i) = self.position(id) else {
            log::warn!("Cannot remove task {}: not in this list", id);
            return None;
        };
        let task = self.tasks.remove(i);
        if let Some(handle) = &self.scheduler {
            handle.cancel_task(id);
        }
        log::info!("{} is removed", task.name);
        Some(task)
    }

    /// Important tasks first; inside each group by `added_date_time`,
    /// ascending unless `reverse`. Stable for equal timestamps.
    pub fn sort(&mut self, reverse: bool) {
        self.tasks.sort_by(|a, b| {
            b.is_important.cmp(&a.is_important).then_with(|| {
                let by_time = a.added_date_time.cmp(&b.added_date_time);
                if reverse {
                    by_time.reverse()
                } else {
                    by_time
                }
            })
        });
    }

    /// Stars or un-stars a task, then re-sorts the list ascending.
    pub fn set_important(&mut self, id: TaskId, flag: bool) -> Result<()> {
        let task = self.get_mut(id)?;
        task.is_important = flag;
        if flag {
            log::info!("Task '{}' is marked as important.", task.name);
        } else {
            log::info!("Task '{}' is no longer important.", task.name);
        }
        self.sort(false);
        Ok(())
    }

    /// Overwrites the due fields.
    ///
    /// Reminders registered when the task was added are left untouched;
    /// they are not moved to the new date.
    pub fn set_due_date(&mut self, id: TaskId, date: impl Into<String>, time: impl Into<String>) -> Result<()> {
        let task = self.get_mut(id)?;
        task.due_date = date.into();
        task.due_time = time.into();
        if self.scheduler.is_some() {
            log::debug!("Due date of {} changed; existing reminders keep their old time", id);
        }
        Ok(())
    }

    pub fn rename(&mut self, id: TaskId, new_name: impl Into<String>) -> Result<()> {
        let new_name = new_name.into();
        if new_name.trim().is_empty() {
            return Err(AdmError::EmptyName);
        }
        self.get_mut(id)?.name = new_name;
        Ok(())
    }

    /// Checkbox handler: flips `pending` on every call and returns the new value.
    pub fn toggle_pending(&mut self, id: TaskId) -> Result<bool> {
        let task = self.get_mut(id)?;
        task.pending = !task.pending;
        Ok(task.pending)
    }

    /// Moves the task at `from` so that it ends up at index `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tasks.len() || to >= self.tasks.len() {
            return false;
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        true
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AdmError::TaskNotFound(id))
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Finds a task by 1-based position in the list or by an id prefix of
    /// at least [`MIN_ID_PREFIX`] characters.
    pub fn resolve(&self, selector: &str) -> Option<TaskId> {
        if let Ok(n) = selector.parse::<usize>() {
            if n >= 1 && n <= self.tasks.len() {
                return Some(self.tasks[n - 1].id);
            }
        }
        if selector.len() < MIN_ID_PREFIX {
            return None;
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.matches_prefix(selector));
        match (matches.next(), matches.next()) {
            (Some(t), None) => Some(t.id),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Reads tasks from a newline-delimited JSON file, in file order.
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self::with_tasks(storage::load_records(path)?))
    }

    /// Rewrites the file with the whole list, in display order.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        storage::save_records(path, &self.tasks)
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        storage::save_snapshot(path, &self.tasks)
    }

    pub fn load_snapshot(path: &Path) -> Result<Self> {
        Ok(Self::with_tasks(storage::load_snapshot(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_item_reorders() {
        let mut store = TaskStore::new();
        let a = store.add(Task::new("a").unwrap());
        let b = store.add(Task::new("b").unwrap());
        let c = store.add(Task::new("c").unwrap());
        assert!(store.move_item(2, 0));
        let order: Vec<_> = store.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![c, a, b]);
        assert!(!store.move_item(0, 3));
    }

    #[test]
    fn resolve_by_position_and_prefix() {
        let mut store = TaskStore::new();
        let a = store.add(Task::new("a").unwrap());
        let b = store.add(Task::new("b").unwrap());
        assert_eq!(store.resolve("1"), Some(a));
        assert_eq!(store.resolve("2"), Some(b));
        assert_eq!(store.resolve(&b.short()), Some(b));
        assert_eq!(store.resolve("0"), None);
    }

    #[test]
    fn rename_rejects_empty() {
        let mut store = TaskStore::new();
        let a = store.add(Task::new("a").unwrap());
        assert!(matches!(store.rename(a, ""), Err(AdmError::EmptyName)));
        store.rename(a, "b").unwrap();
        assert_eq!(store.get(a).unwrap().name, "b");
    }
}
