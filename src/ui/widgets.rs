//! Reusable UI widget helpers

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{List, ListState},
    Frame,
};

use crate::form::ValueSource;

/// Render a list that scrolls to keep the selected item in view
pub fn render_scrollable_list(frame: &mut Frame, area: Rect, list: List, selected_index: usize) {
    let mut list_state = ListState::default().with_selected(Some(selected_index));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Colour coding for where a field's value came from
pub fn source_style(source: ValueSource) -> Style {
    let color = match source {
        ValueSource::PriorSubmission => Color::Yellow,
        ValueSource::Explicit => Color::Cyan,
        ValueSource::BoundData => Color::Green,
        ValueSource::Default => Color::Blue,
        ValueSource::Unresolved => Color::DarkGray,
    };
    Style::default().fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_have_distinct_colors() {
        let sources = [
            ValueSource::PriorSubmission,
            ValueSource::Explicit,
            ValueSource::BoundData,
            ValueSource::Default,
            ValueSource::Unresolved,
        ];
        let mut colors: Vec<_> = sources.iter().map(|s| source_style(*s).fg).collect();
        colors.dedup();
        assert_eq!(colors.len(), sources.len());
    }
}
