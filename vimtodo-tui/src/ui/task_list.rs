use super::utils::to_local_time;
use super::*;
use crate::types::Task;
use time::macros::format_description;

fn created_label(task: &Task) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    to_local_time(task.created_at)
        .format(&format)
        .unwrap_or_default()
}

fn task_row<'a>(task: &'a Task, editing: Option<&'a crate::app::EditBuffer>) -> ListItem<'a> {
    let checkbox = if task.completed { "[x] " } else { "[ ] " };
    let mut spans = vec![Span::styled(
        checkbox,
        Style::default().fg(if task.completed {
            Color::Green
        } else {
            Color::DarkGray
        }),
    )];

    match editing {
        Some(edit) => {
            let (before, after) = edit.buffer.split_at_cursor();
            spans.push(Span::styled(
                format!("{}█{}", before, after),
                Style::default().fg(Color::Yellow),
            ));
        }
        None => {
            let text_style = if task.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(task.task.as_str(), text_style));
        }
    }

    if task.is_provisional() {
        spans.push(Span::styled(" (saving)", Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::styled(
            format!("  {}", created_label(task)),
            Style::default().fg(Color::DarkGray),
        ));
    }

    ListItem::new(Line::from(spans))
}

pub fn render_task_list(frame: &mut Frame, area: Rect, app: &App) {
    let tasks = app.tasks();
    let done = tasks.iter().filter(|t| t.completed).count();
    let title = format!(" Tasks {}/{} ", done, tasks.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title)
        .padding(Padding::horizontal(1));

    if tasks.is_empty() {
        let message = if app.model.is_loading() {
            "Loading..."
        } else {
            "No tasks yet"
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let active_edit = app.edit.active();
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| task_row(task, active_edit.filter(|edit| edit.task_id == task.id)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 60))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(app.vim.selected()));
    frame.render_stateful_widget(list, area, &mut list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TaskResponse;
    use ratatui::{backend::TestBackend, Terminal};
    use time::OffsetDateTime;

    fn render_to_string(app: &mut App) -> String {
        let backend = TestBackend::new(60, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| super::super::render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn list_shows_tasks_and_edit_buffer() {
        let mut app = App::new("Dev User".to_string(), true);
        let task = |id: &str, text: &str, completed| Task {
            id: id.to_string(),
            task: text.to_string(),
            completed,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let call = app.model.list();
        app.model.settle(
            call.ticket,
            Ok(TaskResponse::Listed(vec![
                task("1", "buy milk", false),
                task("2", "call mom", true),
            ])),
        );
        app.start_editing("2");

        let screen = render_to_string(&mut app);
        assert!(screen.contains("Tasks 1/2"));
        assert!(screen.contains("[ ] buy milk"));
        assert!(screen.contains("[x] call mom█"));
        assert!(screen.contains("NORMAL"));
    }
}
