use super::*;
use crate::vim::Mode;

const LABEL: &str = " vimtodo";

pub fn render_status_bar(frame: &mut Frame, area: Rect, app: &mut App) {
    let mode_style = match app.vim.mode() {
        Mode::Normal => Style::default().fg(Color::Black).bg(Color::Red),
        Mode::Insert => Style::default().fg(Color::Black).bg(Color::Green),
    };
    let mode_label = format!(" {} ", app.vim.mode());
    let user_label = if app.dev_mode {
        format!("{} (dev) ", app.user_name)
    } else {
        format!("{} ", app.user_name)
    };

    let title_width = 1 + LABEL.len() as u16 + 1;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(title_width),
            Constraint::Length(mode_label.len() as u16 + 1),
            Constraint::Min(0),
            Constraint::Length(user_label.chars().count() as u16),
        ])
        .split(area);

    // Throbber spins while a list call is in flight.
    let throbber_area = Rect {
        x: cols[0].x + 1,
        y: cols[0].y,
        width: 1,
        height: 1,
    };
    let label_area = Rect {
        x: throbber_area.x + 1,
        y: cols[0].y,
        width: cols[0].width.saturating_sub(2),
        height: 1,
    };
    let throbber = throbber_widgets_tui::Throbber::default()
        .style(Style::default().fg(Color::Yellow))
        .throbber_style(Style::default().fg(Color::Yellow))
        .throbber_set(throbber_widgets_tui::BRAILLE_SIX)
        .use_type(if app.model.is_loading() {
            throbber_widgets_tui::WhichUse::Spin
        } else {
            throbber_widgets_tui::WhichUse::Full
        });
    frame.render_stateful_widget(throbber, throbber_area, &mut app.throbber_state);
    frame.render_widget(
        Paragraph::new(Span::styled(LABEL, Style::default().fg(Color::Yellow))),
        label_area,
    );

    frame.render_widget(
        Paragraph::new(Span::styled(mode_label, mode_style.add_modifier(Modifier::BOLD))),
        cols[1],
    );

    let pending = app
        .vim
        .command_buffer()
        .map(|c| format!(" {}", c))
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(pending, Style::default().fg(Color::Cyan))),
        cols[2],
    );

    frame.render_widget(
        Paragraph::new(Span::styled(user_label, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Right),
        cols[3],
    );
}
