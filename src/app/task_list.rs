use chrono::{Duration, NaiveDate};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::app::error::Result;
use crate::app::models::Task;
use crate::app::search::SearchFilter;
use crate::app::storage::TaskRepository;

// Counters shown in the statistics box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub open: usize,
    pub due_next_week: usize,
    pub overdue: usize,
}

// The rows currently on screen: whatever the repository returned for the
// active filter, in repository order
pub struct TaskList<'a> {
    pub state: ListState,
    pub items: Vec<Task>,
    repository: &'a TaskRepository,
    filter: SearchFilter,
}

impl<'a> TaskList<'a> {
    // Initialize a task list with every task from the repository
    pub fn with_items_from_storage(repository: &'a TaskRepository) -> Result<TaskList<'a>> {
        let mut list = TaskList {
            state: ListState::default(),
            items: Vec::new(),
            repository,
            filter: SearchFilter::default(),
        };
        list.update_items()?;
        Ok(list)
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    // Re-query with the active filter, keeping the selection in range
    pub fn update_items(&mut self) -> Result<()> {
        self.items = self.filter.apply(self.repository)?;
        match self.state.selected() {
            Some(_) if self.items.is_empty() => self.state.select(None),
            Some(i) if i >= self.items.len() => self.state.select(Some(self.items.len() - 1)),
            _ => {}
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: SearchFilter) -> Result<()> {
        self.filter = filter;
        self.state.select(None);
        self.update_items()
    }

    // Move the selection to the next item, wrapping around
    pub fn next(&mut self) {
        if self.items.is_empty() {
            return self.unselect();
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    // Move the selection to the previous item, wrapping around
    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return self.unselect();
        }
        let i = match self.state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn unselect(&mut self) {
        self.state.select(None);
    }

    pub fn get_selected(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        let next_week = today + Duration::weeks(1);
        let open = || self.items.iter().filter(|task| !task.completed);
        Statistics {
            total: self.items.len(),
            open: open().count(),
            due_next_week: open()
                .filter(|task| task.due_date.is_some_and(|due| due >= today && due < next_week))
                .count(),
            overdue: open()
                .filter(|task| task.due_date.is_some_and(|due| due < today))
                .count(),
        }
    }
}

fn priority_color(priority: i32) -> Color {
    match priority {
        5 => Color::Red,
        4 => Color::LightRed,
        3 => Color::Yellow,
        1 => Color::Gray,
        _ => Color::White,
    }
}

// Build the UI (list) for task list
pub fn get_list_items_ui(tasks: &[Task]) -> Vec<ListItem<'_>> {
    tasks
        .iter()
        .map(|task| {
            let mut title = Span::from(task.title.as_str()).fg(priority_color(task.priority));
            if task.completed {
                title = title.crossed_out();
            }
            let lines = vec![
                Line::from(vec![
                    Span::from(if task.completed { "[x] " } else { "[ ] " }),
                    title,
                ]),
                Line::from(vec![
                    Span::from(format!("    P{}", task.priority)),
                    Span::from(format!(
                        "  Due: {}",
                        task.due_date_text().unwrap_or_else(|| "-".into())
                    )),
                    Span::from(format!("  {}", task.description)).fg(Color::Gray),
                ]),
            ];
            ListItem::new(lines).style(Style::default().fg(Color::White))
        })
        .collect()
}

// Build the UI (lines) for statistics infobox
pub fn get_statistics_ui<'a>(statistics: Statistics) -> Vec<Line<'a>> {
    vec![
        Line::from(format!("Shown tasks: {}", statistics.total)),
        Line::from(format!("Open tasks: {}", statistics.open)),
        Line::from(format!("Due next week: {}", statistics.due_next_week)),
        Line::from(format!("Overdue: {}", statistics.overdue)),
    ]
}

// Build the UI (lines) for instructions infobox
pub fn get_instructions_ui<'a>() -> Vec<Line<'a>> {
    vec![
        "Enter - toggle done".into(),
        "a - add a task".into(),
        "e - edit a task".into(),
        "x - delete a task".into(),
        "/ - search".into(),
        "r - reset search".into(),
        "s - export CSV".into(),
        "q - quit".into(),
    ]
}
