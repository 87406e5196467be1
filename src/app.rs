//! Preview application state

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::form::{BuildOutput, FieldSnapshot};
use crate::ui::rows::{flatten, Row};

/// State of the form preview
pub struct App {
    /// Shown in the list title
    pub title: String,
    pub output: BuildOutput,
    pub rows: Vec<Row>,
    pub selected_index: usize,
    should_quit: bool,
}

impl App {
    pub fn new(title: impl Into<String>, output: BuildOutput) -> Self {
        let rows = flatten(&output.root);
        Self {
            title: title.into(),
            output,
            rows,
            selected_index: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected_index)
    }

    pub fn selected_field(&self) -> Option<&FieldSnapshot> {
        self.selected_row().and_then(Row::field)
    }

    pub fn field_count(&self) -> usize {
        self.rows.iter().filter(|row| row.field().is_some()).count()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        let last = self.rows.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_index = (self.selected_index + 1).min(last);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::PageDown => {
                self.selected_index = (self.selected_index + 10).min(last);
            }
            KeyCode::PageUp => {
                self.selected_index = self.selected_index.saturating_sub(10);
            }
            KeyCode::Char('g') | KeyCode::Home => self.selected_index = 0,
            KeyCode::Char('G') | KeyCode::End => self.selected_index = last,
            _ => {}
        }
    }
}
