//! UI module for rendering the form preview

mod layout;
pub mod rows;
mod widgets;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::form::FieldSnapshot;
use rows::RowKind;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (list_area, detail_area, status_area) = layout::create_layout(frame.area());

    draw_rows(frame, list_area, app);
    draw_detail(frame, detail_area, app);
    layout::draw_status_bar(frame, status_area, app);
}

fn draw_rows(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let style = match &row.kind {
                RowKind::Node { selected: true, .. } => Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
                RowKind::Node { .. } => Style::default().add_modifier(Modifier::BOLD),
                RowKind::Field { field, .. } => widgets::source_style(field.source),
            };
            ListItem::new(Line::from(Span::styled(row.title(), style)))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} ", app.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    widgets::render_scrollable_list(frame, area, list, app.selected_index);
}

fn draw_detail(frame: &mut Frame, area: Rect, app: &App) {
    let lines = match app.selected_row().map(|row| &row.kind) {
        Some(RowKind::Field { field, hidden }) => field_lines(field, *hidden),
        Some(RowKind::Node {
            path,
            relation,
            selected,
        }) => {
            let path = if path.is_empty() { "(root)" } else { path.as_str() };
            let mut lines = vec![detail_line("path", path)];
            if let Some(kind) = relation {
                lines.push(detail_line("relation", kind.label()));
                lines.push(detail_line("selected", if *selected { "yes" } else { "no" }));
            }
            lines
        }
        None => vec![Line::from("(empty form)")],
    };

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Detail ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(detail, area);
}

fn field_lines(field: &FieldSnapshot, hidden: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        detail_line("name", &field.name),
        detail_line("key path", &field.key_path),
        detail_line("kind", &field.kind),
        detail_line("namespace", if hidden { "hidden" } else { "visible" }),
    ];
    if let Some(label) = &field.label {
        lines.push(detail_line("label", label));
    }
    let value = field
        .value
        .as_ref()
        .map_or_else(|| "(none)".to_string(), |value| value.to_string());
    lines.push(detail_line("value", &value));
    if let Some(checked) = field.checked {
        lines.push(detail_line("checked", if checked { "yes" } else { "no" }));
    }
    lines.push(Line::from(vec![
        Span::styled("source: ", Style::default().fg(Color::DarkGray)),
        Span::styled(field.source.label(), widgets::source_style(field.source)),
    ]));
    for (key, value) in &field.attributes {
        lines.push(detail_line(key, value));
    }
    lines
}

fn detail_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
        Span::raw(value.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{formlet, Field, Form};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn app() -> App {
        let mut form = Form::from_rc(formlet(|form| {
            form.add_field(Field::text("title").label("Title"))?;
            form.add_field(Field::checkbox("active"))
        }))
        .with_model(json!({"title": "Order", "active": true}))
        .unwrap();
        App::new("order", form.build().unwrap().clone())
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_lists_fields() {
        let screen = screen(&app());
        assert!(screen.contains("title = Order"));
        assert!(screen.contains("active = [x]"));
        assert!(screen.contains("POST"));
    }

    #[test]
    fn test_detail_follows_selection() {
        let mut app = app();
        app.selected_index = 1;
        let screen = screen(&app);
        assert!(screen.contains("key path: title"));
        assert!(screen.contains("source: bound data"));
    }

    #[test]
    fn test_field_lines_include_checked_state() {
        let app = app();
        let active = app.output.field("active").unwrap();
        let text: Vec<String> = field_lines(active, false)
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect();
        assert!(text.contains(&"checked: yes".to_string()));
    }
}
