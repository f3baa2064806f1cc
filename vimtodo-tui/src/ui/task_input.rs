use super::*;
use crate::app::DRAFT_LIMIT;
use crate::vim::InputOwner;

pub fn render_task_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.vim.owner() == InputOwner::NewTaskInput;
    let draft = app.model.draft();

    let text = if focused {
        let (before, after) = draft.split_at_cursor();
        Line::from(Span::styled(
            format!("{}█{}", before, after),
            Style::default().fg(Color::White),
        ))
    } else if draft.is_empty() {
        Line::from(Span::styled(
            "Press i or o to add a task",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            draft.value.clone(),
            Style::default().fg(Color::Gray),
        ))
    };

    let counter = match app.model.draft_remaining_warning() {
        Some(left) => Span::styled(
            format!(" {} left ", left),
            Style::default().fg(Color::Red),
        ),
        None => Span::styled(
            format!(" {}/{} ", draft.char_count(), DRAFT_LIMIT),
            Style::default().fg(Color::DarkGray),
        ),
    };

    let border = if focused { Color::Green } else { Color::DarkGray };
    let input = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" New task ")
            .title_bottom(Line::from(counter).right_aligned())
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(input, area);
}
