use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph},
    Frame,
};

mod help_overlay;
mod status_bar;
mod task_input;
mod task_list;
pub(super) mod utils;

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // 0: Status bar
            Constraint::Length(3), // 1: New task input
            Constraint::Min(0),    // 2: Task list
            Constraint::Length(1), // 3: Error line
            Constraint::Length(1), // 4: Key hints
        ])
        .split(frame.area());

    status_bar::render_status_bar(frame, root[0], app);
    task_input::render_task_input(frame, root[1], app);
    task_list::render_task_list(frame, root[2], app);
    render_error_line(frame, root[3], app);
    render_key_hints(frame, root[4], app);

    if app.show_help {
        help_overlay::render_help_overlay(frame);
    }
}

fn render_error_line(frame: &mut Frame, area: Rect, app: &App) {
    let Some(error) = app.model.error() else {
        return;
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", error), Style::default().fg(Color::Red)),
        Span::styled("(x to dismiss)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_key_hints(frame: &mut Frame, area: Rect, app: &App) {
    let hints: &[(&str, &str)] = if app.edit.is_active() {
        &[("Enter", "Save"), ("Esc", "Cancel")]
    } else if app.vim.owner() == crate::vim::InputOwner::NewTaskInput {
        &[("Enter", "Add"), ("Esc", "Discard"), ("Ctrl+C", "Leave input")]
    } else {
        &[
            ("j/k", "Move"),
            ("i/o", "Add"),
            ("Enter", "Toggle"),
            ("e", "Edit"),
            ("dd", "Delete"),
            ("r", "Reload"),
            ("?", "Help"),
            ("q", "Quit"),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            format!(": {}  ", label),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
