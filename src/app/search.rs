// Search filters and the small form used to edit them
use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::app::error::Result;
use crate::app::models::{Task, MAX_PRIORITY, MIN_PRIORITY};
use crate::app::storage::TaskRepository;

// Filters are combined with AND; unset ones match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub text: String,
    pub priority: Option<i32>,
    pub show_completed: Option<bool>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.priority.is_none() && self.show_completed.is_none()
    }

    pub fn apply(&self, repository: &TaskRepository) -> Result<Vec<Task>> {
        if self.is_empty() {
            return repository.list_all();
        }
        let text = Some(self.text.trim()).filter(|t| !t.is_empty());
        repository.search(text, self.priority, self.show_completed)
    }

    // Short human readable summary, used in the list title
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.text.trim().is_empty() {
            parts.push(format!("\"{}\"", self.text.trim()));
        }
        if let Some(priority) = self.priority {
            parts.push(format!("priority {priority}"));
        }
        if let Some(completed) = self.show_completed {
            parts.push(status_label(Some(completed)).to_lowercase());
        }
        parts.join(", ")
    }

    // Any -> 1 -> 2 -> ... -> 5 -> Any
    fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            None => Some(MIN_PRIORITY),
            Some(p) if p >= MAX_PRIORITY => None,
            Some(p) => Some(p + 1),
        };
    }

    // Any -> Open -> Done -> Any
    fn cycle_status(&mut self) {
        self.show_completed = match self.show_completed {
            None => Some(false),
            Some(false) => Some(true),
            Some(true) => None,
        };
    }
}

fn status_label(show_completed: Option<bool>) -> &'static str {
    match show_completed {
        None => "Any",
        Some(false) => "Open",
        Some(true) => "Done",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Apply(SearchFilter),
    Cancel,
}

// State of the search dialog; starts from the filter currently in use
#[derive(Debug, Clone)]
pub struct SearchForm {
    filter: SearchFilter,
}

impl SearchForm {
    pub fn new(current: &SearchFilter) -> SearchForm {
        SearchForm {
            filter: current.clone(),
        }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<SearchOutcome> {
        match key {
            KeyCode::Esc => return Some(SearchOutcome::Cancel),
            KeyCode::Enter => return Some(SearchOutcome::Apply(self.filter.clone())),
            KeyCode::Tab => self.filter.cycle_priority(),
            KeyCode::BackTab => self.filter.cycle_status(),
            KeyCode::Backspace => {
                self.filter.text.pop();
            }
            KeyCode::Char(c) => self.filter.text.push(c),
            _ => {}
        }
        None
    }
}

pub fn get_search_ui(form: &SearchForm) -> Vec<Line<'_>> {
    const LABEL: Style = Style::new().fg(Color::White);
    const VALUE: Style = Style::new().fg(Color::Black).bg(Color::White);
    let filter = form.filter();
    let priority = filter
        .priority
        .map_or_else(|| "Any".to_string(), |p| p.to_string());

    vec![
        Line::from(vec![
            Span::styled("Text:     ", LABEL),
            Span::styled(filter.text.as_str(), LABEL),
            Span::styled(" ", VALUE),
        ]),
        Line::from(vec![Span::styled("Priority: ", LABEL), Span::styled(priority, VALUE)]),
        Line::from(vec![
            Span::styled("Status:   ", LABEL),
            Span::styled(status_label(filter.show_completed), VALUE),
        ]),
        Line::raw(""),
        Line::from(Span::styled("Tab - priority, Shift+Tab - status", LABEL)),
        Line::from(Span::styled("Enter - search, Esc - cancel", LABEL)),
    ]
}
