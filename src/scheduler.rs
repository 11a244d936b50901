//! Reminder scheduling.
//!
//! Jobs live in a mutex-guarded queue shared through [`SchedulerHandle`].
//! A polling thread takes due jobs once per [`POLL_INTERVAL`] and hands them
//! over a channel to a dispatcher thread, which is the only place the
//! notification sink is called. A slow sink therefore delays other
//! notifications but never the polling itself.
//!
//! A job taken by the poller stays "in flight" until the dispatcher claims
//! it. Cancelling a task also drops its in-flight jobs, so a task removed
//! while its notification waits behind a slow sink is never announced.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::error::Result;
use crate::models::{Task, TaskId};
use crate::notify::{Notification, NotificationSink};

/// How often the background loop looks for due jobs.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Minutes before the due time that the early reminder fires.
pub const REMINDER_LEAD_MINUTES: i64 = 5;

const NOTIFICATION_TITLE: &str = "Task Reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Scheduled,
    Fired,
    Cancelled,
}

/// A one-shot notification tied to a task's due timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u64,
    pub task_id: TaskId,
    /// Absolute local time, never a time of day alone.
    pub fire_at: NaiveDateTime,
    pub message: String,
    pub state: JobState,
}

#[derive(Debug, Default)]
struct JobQueue {
    next_id: u64,
    /// Scheduled jobs ordered by `fire_at`.
    jobs: Vec<Job>,
    /// Taken by the poller, not yet handed to the sink. Job id to task id.
    in_flight: HashMap<u64, TaskId>,
}

impl JobQueue {
    fn push(&mut self, task_id: TaskId, fire_at: NaiveDateTime, message: String) {
        self.next_id += 1;
        let job = Job {
            id: self.next_id,
            task_id,
            fire_at,
            message,
            state: JobState::Scheduled,
        };
        let at = self.jobs.partition_point(|j| j.fire_at <= fire_at);
        self.jobs.insert(at, job);
    }

    fn cancel(&mut self, task_id: TaskId) -> Vec<Job> {
        let (cancelled, kept): (Vec<Job>, Vec<Job>) =
            self.jobs.drain(..).partition(|j| j.task_id == task_id);
        self.jobs = kept;
        self.in_flight.retain(|_, t| *t != task_id);
        cancelled
            .into_iter()
            .map(|mut j| {
                j.state = JobState::Cancelled;
                j
            })
            .collect()
    }

    fn take_due(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let split = self.jobs.partition_point(|j| j.fire_at <= now);
        let due: Vec<Job> = self
            .jobs
            .drain(..split)
            .map(|mut j| {
                j.state = JobState::Fired;
                j
            })
            .collect();
        for j in &due {
            self.in_flight.insert(j.id, j.task_id);
        }
        due
    }

    fn claim(&mut self, job_id: u64) -> bool {
        self.in_flight.remove(&job_id).is_some()
    }
}

/// Cloneable access to the job queue, used by task stores to register and
/// cancel reminders from the UI thread.
#[derive(Debug, Clone, Default)]
pub struct SchedulerHandle {
    queue: Arc<Mutex<JobQueue>>,
}

impl SchedulerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JobQueue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers the reminders for `task`, replacing any it already had.
    ///
    /// Enqueues "due in 5 minutes" when that moment is strictly after `now`,
    /// and "now due" when the due time is strictly after `now`. Returns the
    /// number of jobs registered.
    pub fn try_schedule_task(&self, task: &Task, now: NaiveDateTime) -> Result<usize> {
        let due = match task.due_timestamp()? {
            Some(due) => due,
            None => return Ok(0),
        };
        let mut queue = self.lock();
        queue.cancel(task.id);

        let mut registered = 0;
        let reminder = due - chrono::Duration::minutes(REMINDER_LEAD_MINUTES);
        if reminder > now {
            queue.push(
                task.id,
                reminder,
                format!("{} is due in {} minutes.", task.name, REMINDER_LEAD_MINUTES),
            );
            registered += 1;
        }
        if due > now {
            queue.push(task.id, due, format!("{} is now due.", task.name));
            registered += 1;
        }
        Ok(registered)
    }

    /// Like [`try_schedule_task`](Self::try_schedule_task) but never fails:
    /// a malformed due date is logged and no job is registered.
    pub fn schedule_task(&self, task: &Task, now: NaiveDateTime) -> usize {
        match self.try_schedule_task(task, now) {
            Ok(n) => {
                if n > 0 {
                    log::debug!("Scheduled {} reminder(s) for '{}'", n, task.name);
                }
                n
            }
            Err(e) => {
                log::error!("Not scheduling reminders for '{}': {}", task.name, e);
                0
            }
        }
    }

    /// Removes every scheduled job belonging to `task_id`, including jobs
    /// already taken but not yet delivered.
    pub fn cancel_task(&self, task_id: TaskId) -> Vec<Job> {
        let cancelled = self.lock().cancel(task_id);
        if !cancelled.is_empty() {
            log::debug!("Cancelled {} reminder(s) for task {}", cancelled.len(), task_id);
        }
        cancelled
    }

    /// Takes the jobs whose time has come, marking them fired. They stay in
    /// flight until [`claim`](Self::claim)ed.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<Job> {
        self.lock().take_due(now)
    }

    /// Called right before delivery. Returns `false` when the job's task was
    /// cancelled after the job was taken, in which case it must be dropped.
    pub fn claim(&self, job_id: u64) -> bool {
        self.lock().claim(job_id)
    }

    /// Number of taken jobs waiting for the dispatcher.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Snapshot of the jobs still waiting, earliest first.
    pub fn pending(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    pub fn pending_for(&self, task_id: TaskId) -> Vec<Job> {
        self.lock()
            .jobs
            .iter()
            .filter(|j| j.task_id == task_id)
            .cloned()
            .collect()
    }
}

fn fire_due(handle: &SchedulerHandle, tx: &Sender<(u64, Notification)>, app_name: &str, now: NaiveDateTime) -> usize {
    let due = handle.take_due(now);
    let fired = due.len();
    for job in due {
        let job_id = job.id;
        let n = Notification {
            title: NOTIFICATION_TITLE.to_string(),
            message: job.message,
            app_name: app_name.to_string(),
        };
        if tx.send((job_id, n)).is_err() {
            handle.claim(job_id);
            log::warn!("Notification dispatcher is gone, dropping reminder");
        }
    }
    fired
}

/// The background polling loop plus its notification dispatcher.
pub struct NotificationScheduler {
    handle: SchedulerHandle,
    app_name: String,
    tx: Option<Sender<(u64, Notification)>>,
    stop: Option<Sender<()>>,
    poller: Option<JoinHandle<()>>,
}

impl NotificationScheduler {
    /// Starts polling every [`POLL_INTERVAL`].
    pub fn start(handle: SchedulerHandle, sink: Arc<dyn NotificationSink>, app_name: &str) -> Self {
        Self::start_with_interval(handle, sink, app_name, POLL_INTERVAL)
    }

    pub fn start_with_interval(
        handle: SchedulerHandle,
        sink: Arc<dyn NotificationSink>,
        app_name: &str,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<(u64, Notification)>();

        // Detached: a stuck sink must not block shutdown. It exits once every
        // sender is dropped.
        let claims = handle.clone();
        thread::spawn(move || {
            for (job_id, n) in rx {
                if !claims.claim(job_id) {
                    log::debug!("Dropping reminder for a cancelled task: {}", n.message);
                    continue;
                }
                if let Err(e) = sink.notify(&n) {
                    log::error!("{}", e);
                }
            }
        });

        let (stop, stopped) = mpsc::channel::<()>();
        let poller = {
            let handle = handle.clone();
            let tx = tx.clone();
            let app_name = app_name.to_string();
            thread::spawn(move || loop {
                fire_due(&handle, &tx, &app_name, Local::now().naive_local());
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            })
        };

        log::info!("Reminder scheduler started (poll every {:?})", interval);
        Self {
            handle,
            app_name: app_name.to_string(),
            tx: Some(tx),
            stop: Some(stop),
            poller: Some(poller),
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Fires everything due at `now`. The polling thread calls the same
    /// logic with wall-clock time once per interval.
    pub fn tick(&self, now: NaiveDateTime) -> usize {
        match &self.tx {
            Some(tx) => fire_due(&self.handle, tx, &self.app_name, now),
            None => 0,
        }
    }

    /// Stops the polling loop and waits for it to exit.
    pub fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.tx = None;
        if let Some(poller) = self.poller.take() {
            if poller.join().is_err() {
                log::error!("Reminder polling thread panicked");
            }
            log::info!("Reminder scheduler stopped");
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn queue_stays_ordered_by_fire_time() {
        let mut q = JobQueue::default();
        let a = TaskId::new();
        q.push(a, at(10, 0), "late".into());
        q.push(a, at(9, 0), "early".into());
        q.push(a, at(9, 30), "middle".into());
        let msgs: Vec<_> = q.jobs.iter().map(|j| j.message.as_str()).collect();
        assert_eq!(msgs, ["early", "middle", "late"]);
    }

    #[test]
    fn take_due_is_inclusive_and_one_shot() {
        let mut q = JobQueue::default();
        let a = TaskId::new();
        q.push(a, at(9, 0), "x".into());
        assert!(q.take_due(at(8, 59)).is_empty());
        let fired = q.take_due(at(9, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].state, JobState::Fired);
        assert!(q.take_due(at(9, 1)).is_empty());
    }

    #[test]
    fn cancel_revokes_in_flight_jobs() {
        let mut q = JobQueue::default();
        let (a, b) = (TaskId::new(), TaskId::new());
        q.push(a, at(9, 0), "a".into());
        q.push(b, at(9, 0), "b".into());
        let fired = q.take_due(at(9, 0));
        assert_eq!(q.in_flight.len(), 2);

        q.cancel(b);
        assert!(q.claim(fired[0].id));
        assert!(!q.claim(fired[1].id));
        assert!(!q.claim(fired[0].id));
        assert!(q.in_flight.is_empty());
    }
}
