use adm::app::AppState;
use adm::config::Config;
use adm::models::{Task, TaskId};
use adm::notify::LogSink;
use adm::scheduler::SchedulerHandle;
use adm::store::TaskStore;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn with_state<F>(test_name: &str, f: F)
where
    F: FnOnce(&mut AppState),
{
    let mut dir = env::temp_dir();
    dir.push(format!("adm_app_{}_{}", test_name, std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    let config = Config::from_dirs(dir.clone(), dir.join("cache")).unwrap();
    let mut state = AppState::load(config).unwrap();
    state.start_reminders(Arc::new(LogSink));

    f(&mut state);

    drop(state);
    fs::remove_dir_all(&dir).unwrap();
}

// Far enough ahead that the background loop never fires anything.
fn future_task(name: &str, date: &str) -> Task {
    Task::new(name).unwrap().with_due(date, "09:00 AM")
}

fn handle(state: &AppState) -> SchedulerHandle {
    state.scheduler().unwrap().handle()
}

fn jobs_for(state: &AppState, id: TaskId) -> usize {
    handle(state).pending_for(id).len()
}

#[test]
fn test_check_cancels_and_restores_reminders() {
    with_state("check", |state| {
        let id = state.add_task(future_task("Dentist", "2099-03-01"));
        let other = state.add_task(future_task("Taxes", "2099-04-15"));
        assert_eq!(jobs_for(state, id), 2);

        assert!(state.check(id).unwrap());
        assert_eq!(jobs_for(state, id), 0);
        assert_eq!(jobs_for(state, other), 2);

        assert!(!state.check(id).unwrap());
        assert_eq!(jobs_for(state, id), 2);
        assert_eq!(handle(state).pending().len(), 4);
    });
}

#[test]
fn test_restore_snapshot_swaps_reminders() {
    with_state("snapshot", |state| {
        let kept = state.add_task(future_task("Kept", "2099-03-01"));
        state.save_snapshot().unwrap();

        state.delete(kept);
        let later = state.add_task(future_task("Later", "2099-05-01"));
        assert_eq!(jobs_for(state, kept), 0);
        assert_eq!(jobs_for(state, later), 2);

        assert_eq!(state.restore_snapshot().unwrap(), 1);
        assert_eq!(jobs_for(state, later), 0);
        assert_eq!(jobs_for(state, kept), 2);
        assert_eq!(handle(state).pending().len(), 2);
    });
}

#[test]
fn test_reload_keeps_jobs_of_known_tasks() {
    with_state("reload", |state| {
        let moved = state.add_task(future_task("Moved", "2099-03-01"));
        let dropped = state.add_task(future_task("Dropped", "2099-03-02"));
        state.save().unwrap();
        let before = handle(state).pending_for(moved);

        // Another command edits the file behind our back.
        let path = state.config.tasks_path();
        let mut on_disk = TaskStore::load_from(&path).unwrap();
        on_disk.set_due_date(moved, "2099-09-09", "10:00 AM").unwrap();
        on_disk.remove(dropped);
        let added = on_disk.add(future_task("New", "2099-06-01"));
        on_disk.save_to(&path).unwrap();

        assert_eq!(state.reload_active().unwrap(), 2);
        assert_eq!(handle(state).pending_for(moved), before);
        assert_eq!(jobs_for(state, dropped), 0);
        assert_eq!(jobs_for(state, added), 2);
        assert_eq!(state.active.get(moved).unwrap().due_date, "2099-09-09");
    });
}
