use std::sync::Arc;

use chrono::Local;

use crate::config::Config;
use crate::error::{AdmError, Result};
use crate::models::{Task, TaskId};
use crate::notify::NotificationSink;
use crate::scheduler::{NotificationScheduler, SchedulerHandle};
use crate::store::TaskStore;

/// Everything the UI and CLI handlers operate on.
pub struct AppState {
    pub config: Config,
    /// Tasks still on the to-do list.
    pub active: TaskStore,
    /// Checked-off tasks.
    pub history: TaskStore,
    scheduler: Option<NotificationScheduler>,
}

impl AppState {
    /// Loads both lists from the data directory.
    pub fn load(config: Config) -> Result<Self> {
        let active = TaskStore::load_from(&config.tasks_path())?;
        let history = TaskStore::load_from(&config.history_path())?;
        log::debug!(
            "Loaded {} active and {} finished tasks from {}",
            active.len(),
            history.len(),
            config.data_dir.display()
        );
        Ok(Self {
            config,
            active,
            history,
            scheduler: None,
        })
    }

    /// Starts the reminder loop and registers reminders for the active list.
    pub fn start_reminders(&mut self, sink: Arc<dyn NotificationSink>) {
        let handle = SchedulerHandle::new();
        let scheduler = NotificationScheduler::start(handle.clone(), sink, &self.config.app_name);
        self.active.attach_scheduler(handle, Local::now().naive_local());
        self.scheduler = Some(scheduler);
    }

    pub fn scheduler(&self) -> Option<&NotificationScheduler> {
        self.scheduler.as_ref()
    }

    /// Re-reads the active list after another process changed the file.
    ///
    /// Tasks that were already loaded keep the reminders they had, even if
    /// their due date changed on disk. New tasks get reminders, and tasks
    /// gone from the file lose theirs.
    pub fn reload_active(&mut self) -> Result<usize> {
        let mut reloaded = TaskStore::load_from(&self.config.tasks_path())?;
        if let Some(handle) = self.active.scheduler().cloned() {
            let now = Local::now().naive_local();
            for t in self.active.iter().filter(|t| reloaded.get(t.id).is_none()) {
                handle.cancel_task(t.id);
            }
            for t in reloaded.iter().filter(|t| self.active.get(t.id).is_none()) {
                handle.schedule_task(t, now);
            }
            reloaded.set_scheduler(handle);
        }
        self.active = reloaded;
        Ok(self.active.len())
    }

    pub fn save(&self) -> Result<()> {
        self.active.save_to(&self.config.tasks_path())?;
        self.history.save_to(&self.config.history_path())
    }

    pub fn add_task(&mut self, task: Task) -> TaskId {
        self.active.add(task)
    }

    /// Checkbox on either list: flips `pending` and moves the task to the
    /// other list. Returns `true` when the task ended up in the history.
    pub fn check(&mut self, id: TaskId) -> Result<bool> {
        if self.active.position(id).is_some() {
            self.active.toggle_pending(id)?;
            if let Some(task) = self.active.remove(id) {
                self.history.add(task);
            }
            Ok(true)
        } else if self.history.position(id).is_some() {
            self.history.toggle_pending(id)?;
            if let Some(task) = self.history.remove(id) {
                self.active.add(task);
            }
            Ok(false)
        } else {
            Err(AdmError::TaskNotFound(id))
        }
    }

    /// Deletes a task from whichever list holds it.
    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        if self.active.position(id).is_some() {
            self.active.remove(id)
        } else {
            self.history.remove(id)
        }
    }

    pub fn save_snapshot(&self) -> Result<()> {
        self.active.save_snapshot(&self.config.snapshot_path())
    }

    /// Replaces the active list with the last snapshot. Reminders of the
    /// replaced tasks are cancelled and the restored ones registered.
    pub fn restore_snapshot(&mut self) -> Result<usize> {
        let mut restored = TaskStore::load_snapshot(&self.config.snapshot_path())?;
        if let Some(handle) = self.active.scheduler().cloned() {
            for t in self.active.iter() {
                handle.cancel_task(t.id);
            }
            restored.attach_scheduler(handle, Local::now().naive_local());
        }
        self.active = restored;
        Ok(self.active.len())
    }
}
