use super::utils::centered_rect;
use super::*;

const BINDINGS: &[(&str, &str)] = &[
    ("j / k", "Move down / up"),
    ("gg / G", "First / last task"),
    ("i / o", "Add a task (Insert mode)"),
    ("Enter", "Toggle completed"),
    ("e", "Edit the selected task"),
    ("dd", "Delete the selected task"),
    ("Esc", "Leave Insert mode, clear pending keys"),
    ("Ctrl+C", "Leave Insert mode, keep the draft"),
    ("r", "Reload from server"),
    ("x", "Dismiss the error"),
    ("q", "Quit"),
];

pub fn render_help_overlay(frame: &mut Frame) {
    let height = BINDINGS.len() as u16 + 4;
    let area = centered_rect(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    lines.extend(BINDINGS.iter().map(|(key, description)| {
        Line::from(vec![
            Span::styled(format!("{:<8}", key), Style::default().fg(Color::Yellow)),
            Span::styled(*description, Style::default().fg(Color::White)),
        ])
    }));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(Span::styled(" Keys ", Style::default().fg(Color::Yellow)))
                .title_bottom(Line::from(" ? / Esc to close ").centered())
                .padding(Padding::horizontal(2)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
