use std::sync::Arc;

use ratatui::widgets::TableState;

use crate::app::AppState;
use crate::config::Config;
use crate::error::Result;
use crate::models::{Task, TaskId};
use crate::notify::FallbackSink;
use crate::store::TaskStore;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Tasks,
    History,
}

pub enum InputField {
    None,
    Name,
    Due,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub name: String,
    pub due_date: String,
    pub step: usize, // 0: Name, 1: Due date, 2: Due time
}

pub struct App {
    pub state: AppState,
    pub task_state: TableState,
    pub history_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
    pub add_state: AddState,
    /// Order used by the sort key: newest first when set.
    pub sort_reverse: bool,
    /// Last error or confirmation shown in the help bar.
    pub status: Option<String>,
}

/// Splits `YYYY-MM-DD hh:mm AM` into its date and time parts.
pub fn split_due(input: &str) -> (String, String) {
    match input.trim().split_once(' ') {
        Some((date, time)) => (date.to_string(), time.trim().to_string()),
        None => (input.trim().to_string(), String::new()),
    }
}

impl App {
    /// Loads both lists and starts firing reminders for the active one.
    pub fn new() -> Result<App> {
        let mut state = AppState::load(Config::load()?)?;
        state.start_reminders(Arc::new(FallbackSink::default()));

        let mut app = App {
            state,
            task_state: TableState::default(),
            history_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            sort_reverse: false,
            status: None,
        };
        app.clamp_selection();
        Ok(app)
    }

    fn current(&self) -> (&TaskStore, &TableState) {
        match self.view_mode {
            ViewMode::Tasks => (&self.state.active, &self.task_state),
            ViewMode::History => (&self.state.history, &self.history_state),
        }
    }

    fn current_state_mut(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.task_state,
            ViewMode::History => &mut self.history_state,
        }
    }

    /// The task under the cursor in the current view.
    pub fn selected(&self) -> Option<&Task> {
        let (store, table) = self.current();
        table.selected().and_then(|i| store.tasks().get(i))
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let len = self.current().0.len();
        if len == 0 { return; }
        let state = self.current_state_mut();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let len = self.current().0.len();
        if len == 0 { return; }
        let state = self.current_state_mut();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        for (len, state) in [
            (self.state.active.len(), &mut self.task_state),
            (self.state.history.len(), &mut self.history_state),
        ] {
            if len == 0 {
                state.select(None);
            } else if let Some(i) = state.selected() {
                if i >= len {
                    state.select(Some(len - 1));
                }
            } else {
                state.select(Some(0));
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.state.save() {
            log::error!("{}", e);
            self.status = Some(format!("Save failed: {}", e));
        }
        self.clamp_selection();
    }

    /// Ticks the selected task's checkbox, moving it to the other list.
    pub fn check_selected(&mut self) {
        let Some(id) = self.selected().map(|t| t.id) else { return };
        match self.state.check(id) {
            Ok(_) => self.persist(),
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Toggles the star on the selected task.
    pub fn star_selected(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        let Some((id, starred)) = self.selected().map(|t| (t.id, t.is_important)) else { return };
        if let Err(e) = self.state.active.set_important(id, !starred) {
            self.status = Some(e.to_string());
            return;
        }
        if let Some(i) = self.state.active.position(id) {
            self.task_state.select(Some(i));
        }
        self.persist();
    }

    /// Deletes the currently selected task.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected().map(|t| t.id) else { return };
        if self.state.delete(id).is_some() {
            self.persist();
        }
    }

    /// Moves the selected task one row up (`-1`) or down (`+1`).
    pub fn move_selected(&mut self, delta: isize) {
        if self.view_mode != ViewMode::Tasks { return; }
        let Some(from) = self.task_state.selected() else { return };
        let Some(to) = from.checked_add_signed(delta) else { return };
        if self.state.active.move_item(from, to) {
            self.task_state.select(Some(to));
            self.persist();
        }
    }

    /// Flips between oldest-first and newest-first and re-sorts.
    pub fn toggle_sort(&mut self) {
        self.sort_reverse = !self.sort_reverse;
        self.state.active.sort(self.sort_reverse);
        self.persist();
    }

    /// Toggles between the to-do list and the history.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::History,
            ViewMode::History => ViewMode::Tasks,
        };
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.view_mode = ViewMode::Tasks;
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        if self.view_mode != ViewMode::Tasks { return; }
        let Some(t) = self.selected() else { return };
        let (id, prefill) = match field {
            InputField::Name => (t.id, t.name.clone()),
            InputField::Due => (t.id, t.due_label()),
            InputField::None => return,
        };
        self.target_id = Some(id);
        self.input_buffer = prefill;
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            _ => {}
        }
    }

    /// Handles input for the "Add Task" wizard.
    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            0 => { // Name
                if !self.input_buffer.trim().is_empty() {
                    self.add_state.name = self.input_buffer.clone();
                    self.add_state.step += 1;
                    self.input_buffer.clear();
                }
            }
            1 => { // Due date (optional)
                self.add_state.due_date = self.input_buffer.trim().to_string();
                self.input_buffer.clear();
                if self.add_state.due_date.is_empty() {
                    self.finish_add(String::new());
                } else {
                    self.add_state.step += 1;
                }
            }
            2 => { // Due time (optional)
                let time = self.input_buffer.trim().to_string();
                self.input_buffer.clear();
                self.finish_add(time);
            }
            _ => {}
        }
    }

    fn finish_add(&mut self, due_time: String) {
        self.input_mode = InputMode::Normal;
        let task = match Task::new(self.add_state.name.clone()) {
            Ok(t) => t.with_due(self.add_state.due_date.clone(), due_time),
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        if let Err(e) = task.due_timestamp() {
            self.status = Some(format!("{}; no reminders", e));
        }
        self.state.add_task(task);
        self.persist();
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input(&mut self) {
        if let Some(id) = self.target_id.take() {
            let result = match self.input_field {
                InputField::Name => self.state.active.rename(id, self.input_buffer.clone()),
                InputField::Due => {
                    let (date, time) = split_due(&self.input_buffer);
                    self.state.active.set_due_date(id, date, time)
                }
                InputField::None => Ok(()),
            };
            match result {
                Ok(()) => self.persist(),
                Err(e) => self.status = Some(e.to_string()),
            }
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::split_due;

    #[test]
    fn split_due_separates_date_and_time() {
        assert_eq!(split_due("2025-01-01 09:00 AM"), ("2025-01-01".into(), "09:00 AM".into()));
        assert_eq!(split_due("2025-01-01"), ("2025-01-01".into(), String::new()));
        assert_eq!(split_due(""), (String::new(), String::new()));
    }
}
