use adm::models::Task;
use adm::notify::{Notification, NotificationSink};
use adm::scheduler::{JobState, NotificationScheduler, SchedulerHandle};
use adm::store::TaskStore;
use adm::Result;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

fn jan1(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
}

fn due_task(name: &str) -> Task {
    Task::new(name).unwrap().with_due("2025-01-01", "09:00 AM")
}

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, n: &Notification) -> Result<()> {
        self.seen.lock().unwrap().push(n.clone());
        Ok(())
    }
}

/// Blocks on every call until the test sends a token.
struct StuckSink {
    release: Mutex<mpsc::Receiver<()>>,
}

impl NotificationSink for StuckSink {
    fn notify(&self, _n: &Notification) -> Result<()> {
        let _ = self.release.lock().unwrap().recv();
        Ok(())
    }
}

fn wait_for<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = Instant::now() + StdDuration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(StdDuration::from_millis(10));
    }
    false
}

#[test]
fn test_two_jobs_when_added_early() {
    let handle = SchedulerHandle::new();
    let task = due_task("Standup");
    assert_eq!(handle.schedule_task(&task, jan1(8, 54)), 2);

    let jobs = handle.pending_for(task.id);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].fire_at, jan1(8, 55));
    assert_eq!(jobs[0].message, "Standup is due in 5 minutes.");
    assert_eq!(jobs[1].fire_at, jan1(9, 0));
    assert_eq!(jobs[1].message, "Standup is now due.");
    assert!(jobs.iter().all(|j| j.state == JobState::Scheduled));
}

#[test]
fn test_no_jobs_when_added_late() {
    let handle = SchedulerHandle::new();
    assert_eq!(handle.schedule_task(&due_task("Late"), jan1(9, 1)), 0);
    // Exactly at the due time is not strictly in the future either.
    assert_eq!(handle.schedule_task(&due_task("Late"), jan1(9, 0)), 0);
    assert!(handle.pending().is_empty());
}

#[test]
fn test_only_due_job_inside_lead_window() {
    let handle = SchedulerHandle::new();
    let task = due_task("Soon");
    assert_eq!(handle.schedule_task(&task, jan1(8, 57)), 1);
    assert_eq!(handle.pending()[0].message, "Soon is now due.");
}

#[test]
fn test_no_jobs_without_due_time() {
    let handle = SchedulerHandle::new();
    let task = Task::new("Someday").unwrap().with_due("2025-01-01", "");
    assert_eq!(handle.schedule_task(&task, jan1(0, 0)), 0);
}

#[test]
fn test_malformed_due_date_still_adds() {
    let handle = SchedulerHandle::new();
    let mut store = TaskStore::new();
    store.attach_scheduler(handle.clone(), jan1(0, 0));

    let bad = Task::new("Broken").unwrap().with_due("01/01/2025", "nine");
    assert!(handle.try_schedule_task(&bad, jan1(0, 0)).is_err());

    let id = store.add_at(bad, jan1(0, 0));
    assert_eq!(store.len(), 1);
    assert!(store.get(id).is_some());
    assert!(handle.pending().is_empty());
}

#[test]
fn test_store_add_registers_and_remove_cancels() {
    let handle = SchedulerHandle::new();
    let mut store = TaskStore::new();
    store.attach_scheduler(handle.clone(), jan1(0, 0));

    let keep = store.add_at(due_task("Keep"), jan1(8, 0));
    let gone = store.add_at(due_task("Gone"), jan1(8, 0));
    assert_eq!(handle.pending().len(), 4);

    store.remove(gone);
    assert!(handle.pending_for(gone).is_empty());
    assert_eq!(handle.pending_for(keep).len(), 2);

    let fired = handle.take_due(jan1(9, 0));
    assert_eq!(fired.len(), 2);
    assert!(fired.iter().all(|j| j.task_id == keep && j.state == JobState::Fired));
}

#[test]
fn test_cancel_marks_jobs_cancelled() {
    let handle = SchedulerHandle::new();
    let task = due_task("Cancel me");
    handle.schedule_task(&task, jan1(8, 0));
    let cancelled = handle.cancel_task(task.id);
    assert_eq!(cancelled.len(), 2);
    assert!(cancelled.iter().all(|j| j.state == JobState::Cancelled));
    assert!(handle.take_due(jan1(10, 0)).is_empty());
}

#[test]
fn test_same_clock_time_on_different_days_do_not_collide() {
    let handle = SchedulerHandle::new();
    let today = due_task("Today");
    let tomorrow = Task::new("Tomorrow").unwrap().with_due("2025-01-02", "09:00 AM");
    handle.schedule_task(&today, jan1(8, 0));
    handle.schedule_task(&tomorrow, jan1(8, 0));
    assert_eq!(handle.pending().len(), 4);

    let fired = handle.take_due(jan1(9, 0));
    assert_eq!(fired.len(), 2);
    assert!(fired.iter().all(|j| j.task_id == today.id));
    assert_eq!(handle.pending_for(tomorrow.id).len(), 2);
}

#[test]
fn test_rescheduling_replaces_old_jobs() {
    let handle = SchedulerHandle::new();
    let task = due_task("Twice");
    handle.schedule_task(&task, jan1(8, 0));
    handle.schedule_task(&task, jan1(8, 0));
    assert_eq!(handle.pending().len(), 2);
}

#[test]
fn test_set_due_date_keeps_original_jobs() {
    let handle = SchedulerHandle::new();
    let mut store = TaskStore::new();
    store.attach_scheduler(handle.clone(), jan1(0, 0));
    let id = store.add_at(due_task("Moved"), jan1(8, 0));

    store.set_due_date(id, "2025-01-05", "10:00 AM").unwrap();
    let jobs = handle.pending_for(id);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].fire_at, jan1(9, 0));
}

#[test]
fn test_tick_sends_to_sink() {
    let sink = Arc::new(RecordingSink::default());
    let handle = SchedulerHandle::new();
    let mut scheduler = NotificationScheduler::start_with_interval(
        handle.clone(),
        sink.clone(),
        "ADM",
        StdDuration::from_secs(3600),
    );
    // Far enough ahead that the wall-clock poll never reaches it.
    let day = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
    let task = Task::new("Tick").unwrap().with_due("2099-06-01", "09:00 AM");
    handle.schedule_task(&task, day.and_hms_opt(8, 0, 0).unwrap());

    assert_eq!(scheduler.tick(day.and_hms_opt(8, 55, 0).unwrap()), 1);
    assert!(wait_for(|| sink.messages() == ["Tick is due in 5 minutes."]));
    assert_eq!(scheduler.tick(day.and_hms_opt(8, 56, 0).unwrap()), 0);
    assert_eq!(scheduler.tick(day.and_hms_opt(9, 0, 0).unwrap()), 1);
    assert!(wait_for(|| sink.messages().len() == 2));

    let seen = sink.seen.lock().unwrap().clone();
    assert_eq!(seen[1].message, "Tick is now due.");
    assert_eq!(seen[1].title, "Task Reminder");
    assert_eq!(seen[1].app_name, "ADM");
    scheduler.shutdown();
    assert_eq!(scheduler.tick(day.and_hms_opt(10, 0, 0).unwrap()), 0);
}

#[test]
fn test_background_loop_fires_due_jobs() {
    let sink = Arc::new(RecordingSink::default());
    let handle = SchedulerHandle::new();
    let mut scheduler = NotificationScheduler::start_with_interval(
        handle.clone(),
        sink.clone(),
        "ADM",
        StdDuration::from_millis(10),
    );

    // Registered as if added ten minutes ago; both jobs are already due now.
    let due = Local::now().naive_local() - Duration::minutes(1);
    let task = Task::new("Loop")
        .unwrap()
        .with_due(due.format("%Y-%m-%d").to_string(), due.format("%I:%M %p").to_string());
    let registered_at = Local::now().naive_local() - Duration::minutes(10);
    assert_eq!(handle.schedule_task(&task, registered_at), 2);

    assert!(wait_for(|| sink.messages().len() == 2));
    assert!(handle.pending().is_empty());
    scheduler.shutdown();
}

#[test]
fn test_stuck_sink_does_not_stall_polling() {
    let (release, blocked) = mpsc::channel();
    let sink = Arc::new(StuckSink { release: Mutex::new(blocked) });
    let handle = SchedulerHandle::new();
    let mut scheduler = NotificationScheduler::start_with_interval(
        handle.clone(),
        sink,
        "ADM",
        StdDuration::from_millis(10),
    );

    let now = Local::now().naive_local();
    let due = now - Duration::minutes(1);
    for name in ["a", "b", "c"] {
        let task = Task::new(name)
            .unwrap()
            .with_due(due.format("%Y-%m-%d").to_string(), due.format("%I:%M %p").to_string());
        handle.schedule_task(&task, now - Duration::minutes(10));
    }

    // The sink is stuck on the first notification, yet the queue drains.
    assert!(wait_for(|| handle.pending().is_empty()));

    for _ in 0..6 {
        let _ = release.send(());
    }
    scheduler.shutdown();
}

/// Records each message once the test lets it through.
struct GatedSink {
    release: Mutex<mpsc::Receiver<()>>,
    seen: Mutex<Vec<String>>,
}

impl NotificationSink for GatedSink {
    fn notify(&self, n: &Notification) -> Result<()> {
        let _ = self.release.lock().unwrap().recv();
        self.seen.lock().unwrap().push(n.message.clone());
        Ok(())
    }
}

#[test]
fn test_removed_task_is_not_announced_behind_slow_sink() {
    let (release, gate) = mpsc::channel();
    let sink = Arc::new(GatedSink {
        release: Mutex::new(gate),
        seen: Mutex::new(Vec::new()),
    });
    let handle = SchedulerHandle::new();
    let mut store = TaskStore::new();
    let now = Local::now().naive_local();
    store.attach_scheduler(handle.clone(), now - Duration::minutes(10));

    let due = now - Duration::minutes(1);
    let overdue = |name: &str| {
        Task::new(name)
            .unwrap()
            .with_due(due.format("%Y-%m-%d").to_string(), due.format("%I:%M %p").to_string())
    };
    store.add_at(overdue("Slow"), now - Duration::minutes(10));
    let deleted = store.add_at(overdue("Deleted"), now - Duration::minutes(10));
    assert_eq!(handle.pending().len(), 4);

    let mut scheduler = NotificationScheduler::start_with_interval(
        handle.clone(),
        sink.clone(),
        "ADM",
        StdDuration::from_millis(10),
    );

    // All four jobs are taken; the dispatcher holds the first one at the gate.
    assert!(wait_for(|| handle.pending().is_empty() && handle.in_flight() == 3));

    store.remove(deleted);
    assert_eq!(handle.in_flight(), 1);

    for _ in 0..4 {
        let _ = release.send(());
    }
    assert!(wait_for(|| sink.seen.lock().unwrap().len() == 2));
    thread::sleep(StdDuration::from_millis(50));

    let seen = sink.seen.lock().unwrap().clone();
    assert_eq!(seen, ["Slow is due in 5 minutes.", "Slow is now due."]);
    assert_eq!(handle.in_flight(), 0);
    scheduler.shutdown();
}
