//! Layout components (list, detail pane, status bar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Split the screen into the row list, the detail pane and the status bar
pub fn create_layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Rows
            Constraint::Percentage(40), // Detail
        ])
        .split(rows[0]);

    (columns[0], columns[1], rows[1])
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let output = &app.output;
    let mut spans = vec![Span::styled(
        format!(" {} ", output.method),
        Style::default().fg(Color::Black).bg(Color::Cyan),
    )];
    if output.form_method != output.method {
        spans.push(Span::styled(
            format!(" via {} ", output.form_method),
            Style::default().fg(Color::Gray),
        ));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(
        format!("{} fields, {} hidden at root", app.field_count(), output.hidden_fields().len()),
        Style::default().fg(Color::Gray),
    ));

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let quit_hint = " j/k:move q:quit ";
    let quit_area = Rect {
        x: area.x + area.width.saturating_sub(quit_hint.len() as u16),
        y: area.y,
        width: (quit_hint.len() as u16).min(area.width),
        height: 1,
    };
    let quit_widget =
        Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(quit_widget, quit_area);
}
