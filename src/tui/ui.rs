use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use chrono::Local;
use crate::models::Task;
use super::app::{App, InputMode, ViewMode, InputField};

fn task_rows(tasks: &[Task]) -> Vec<Row<'_>> {
    let now = Local::now().naive_local();
    tasks
        .iter()
        .map(|t| {
            let style = match t.due_timestamp() {
                Ok(Some(due)) if due < now && t.pending => Style::default().fg(Color::Red),
                Err(_) => Style::default().fg(Color::Yellow),
                _ if t.is_important => Style::default().fg(Color::Cyan),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from(if t.pending { "[ ]" } else { "[x]" }),
                Cell::from(t.name.clone()),
                Cell::from(t.due_label()),
                Cell::from(if t.is_important { "★" } else { "☆" }),
            ])
            .style(style)
        })
        .collect()
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(20),
        Constraint::Length(3),
    ];

    let pending = app
        .state
        .scheduler()
        .map(|s| s.handle().pending().len())
        .unwrap_or(0);

    let (tasks, title, table_state) = match app.view_mode {
        ViewMode::Tasks => (
            app.state.active.tasks(),
            format!("ADM - Tasks ({} reminders pending)", pending),
            &mut app.task_state,
        ),
        ViewMode::History => (
            app.state.history.tasks(),
            "ADM - History".to_string(),
            &mut app.history_state,
        ),
    };

    let table = Table::new(task_rows(tasks), widths)
        .header(Row::new(vec!["", "Name", "Due", "★"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], table_state);

    let help_text = match (&app.status, &app.input_mode) {
        (Some(status), InputMode::Normal) => status.clone(),
        (None, InputMode::Normal) => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | Space: Done | s: Star | n: Name | t: Due | d: Del | J/K: Move | o: Sort | h: History".to_string(),
            ViewMode::History => "q: Quit | Space: Back to list | d: Del | h: Tasks".to_string(),
        },
        (_, InputMode::Editing) => "Enter: Save | Esc: Cancel".to_string(),
        (_, InputMode::Adding) => "Enter: Next Step | Esc: Cancel".to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    match app.input_mode {
        InputMode::Editing | InputMode::Adding => {
            let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
            f.render_widget(Clear, area); // Clear the area first

            let title = match app.input_mode {
                InputMode::Adding => match app.add_state.step {
                    0 => "Add Task: Enter Name",
                    1 => "Add Task: Enter Due Date (YYYY-MM-DD, optional)",
                    2 => "Add Task: Enter Due Time (hh:mm AM/PM, optional)",
                    _ => "Add Task",
                },
                InputMode::Editing => match app.input_field {
                    InputField::Name => "Edit Name",
                    InputField::Due => "Edit Due (YYYY-MM-DD hh:mm AM/PM)",
                    InputField::None => "Edit",
                },
                _ => "",
            };

            let input = Paragraph::new(app.input_buffer.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(title));

            f.render_widget(input, area);
        }
        _ => {}
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
