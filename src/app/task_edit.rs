use chrono::NaiveDateTime;
use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::app::models::{format_due_date, parse_due_date, InvalidDate, Task, MAX_PRIORITY, MIN_PRIORITY};

const DEFAULT_PRIORITY: &str = "3";

// Why the editor refused to produce a task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title cannot be empty.")]
    EmptyTitle,

    #[error("Priority must be an integer between 1 and 5.")]
    PriorityNotInteger(String),

    #[error("Priority must be between 1 and 5.")]
    PriorityOutOfRange(i32),

    #[error("Due date must be in YYYY-MM-DD format.")]
    InvalidDueDate(#[from] InvalidDate),
}

// What the caller gets back once the editor closes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Save(Task),
    Cancel,
}

// Input lines of the editor, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    DueDate,
    Priority,
    Completed,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::Title,
        Field::Description,
        Field::DueDate,
        Field::Priority,
        Field::Completed,
    ];

    fn index(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Field {
        Field::ALL[(self.index() + 1).min(Field::ALL.len() - 1)]
    }

    fn previous(self) -> Field {
        Field::ALL[self.index().saturating_sub(1)]
    }
}

// Current content of the task being edited/created, as typed
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskEditContent {
    title: String,
    description: String,
    due_date: String,
    priority: String,
    completed: bool,
}

impl Default for TaskEditContent {
    fn default() -> Self {
        TaskEditContent {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            priority: DEFAULT_PRIORITY.to_string(),
            completed: false,
        }
    }
}

// Modal form for creating a task or editing an existing one.
// Keys go in through handle_key; the editor answers with an outcome
// once the user saves a valid task or cancels.
#[derive(Debug, Clone)]
pub struct TaskEditor {
    task_id: Option<i64>,
    created_at: Option<NaiveDateTime>,
    content: TaskEditContent,
    focus: Field,
    // Char offset inside the focused text field
    cursor: usize,
    error_message: Option<String>,
}

impl TaskEditor {
    // Prepares to accept an input for a new task
    pub fn new_task() -> TaskEditor {
        TaskEditor {
            task_id: None,
            created_at: None,
            content: TaskEditContent::default(),
            focus: Field::Title,
            cursor: 0,
            error_message: None,
        }
    }

    // Prepares to accept an input for an existing task
    pub fn edit_task(task: &Task) -> TaskEditor {
        let content = TaskEditContent {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.map(format_due_date).unwrap_or_default(),
            priority: task.priority.to_string(),
            completed: task.completed,
        };
        TaskEditor {
            task_id: task.id,
            created_at: task.created_at,
            cursor: content.title.chars().count(),
            content,
            focus: Field::Title,
            error_message: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.task_id.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<EditorOutcome> {
        match key {
            KeyCode::Esc => return Some(EditorOutcome::Cancel),
            KeyCode::Enter => return self.save(),
            KeyCode::Down | KeyCode::Tab => self.move_focus(self.focus.next()),
            KeyCode::Up | KeyCode::BackTab => self.move_focus(self.focus.previous()),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.focused_len()),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Char(to_insert) => self.input(to_insert),
            _ => {}
        }
        None
    }

    // Turn the form into a task, or explain why it cannot be one
    pub fn validate(&self) -> Result<Task, ValidationError> {
        let content = &self.content;

        let title = content.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let priority_text = content.priority.trim();
        let priority = priority_text
            .parse::<i32>()
            .map_err(|_| ValidationError::PriorityNotInteger(priority_text.to_string()))?;
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(ValidationError::PriorityOutOfRange(priority));
        }

        let due_text = content.due_date.trim();
        let due_date = if due_text.is_empty() {
            None
        } else {
            Some(parse_due_date(due_text)?)
        };

        Ok(Task {
            id: self.task_id,
            title: title.to_string(),
            description: content.description.trim().to_string(),
            priority,
            due_date,
            completed: content.completed,
            created_at: self.created_at,
        })
    }

    fn save(&mut self) -> Option<EditorOutcome> {
        match self.validate() {
            Ok(task) => {
                self.error_message = None;
                Some(EditorOutcome::Save(task))
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
                None
            }
        }
    }

    // Keeps the horizontal position if the new line is long enough
    fn move_focus(&mut self, field: Field) {
        self.focus = field;
        self.cursor = self.cursor.min(self.focused_len());
    }

    fn focused_len(&self) -> usize {
        self.text(self.focus).map_or(0, |text| text.chars().count())
    }

    fn text(&self, field: Field) -> Option<&String> {
        match field {
            Field::Title => Some(&self.content.title),
            Field::Description => Some(&self.content.description),
            Field::DueDate => Some(&self.content.due_date),
            Field::Priority => Some(&self.content.priority),
            Field::Completed => None,
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.content.title),
            Field::Description => Some(&mut self.content.description),
            Field::DueDate => Some(&mut self.content.due_date),
            Field::Priority => Some(&mut self.content.priority),
            Field::Completed => None,
        }
    }

    // Delete the char before the cursor
    fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let cursor = self.cursor;
        if let Some(text) = self.text_mut(self.focus) {
            let at = byte_index(text, cursor - 1);
            text.remove(at);
            self.cursor -= 1;
        }
    }

    // Insert a char at the cursor of the focused field.
    // The completion line has no text: space toggles it, y/n set it.
    fn input(&mut self, to_insert: char) {
        match self.focus {
            Field::Completed => match to_insert {
                ' ' => self.content.completed = !self.content.completed,
                'y' | 'Y' => self.content.completed = true,
                'n' | 'N' => self.content.completed = false,
                _ => {}
            },
            Field::Priority if !to_insert.is_ascii_digit() => {}
            field => {
                let cursor = self.cursor;
                if let Some(text) = self.text_mut(field) {
                    let at = byte_index(text, cursor);
                    text.insert(at, to_insert);
                    self.cursor += 1;
                }
            }
        }
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i)
}

// Returns the UI content for the task edit dialog
pub fn get_task_edit_ui(editor: &TaskEditor) -> Vec<Line<'_>> {
    const GRAY_TEXT: Style = Style::new().fg(Color::Rgb(100, 100, 100));
    const WHITE_TEXT: Style = Style::new().fg(Color::White);
    const BLACK_ON_WHITE: Style = Style::new().fg(Color::Black).bg(Color::White);
    let mut text = Vec::new();

    for field in Field::ALL {
        let (prefix, placeholder) = match field {
            Field::Title => ("Title:       ", "My task name"),
            Field::Description => ("Description: ", "My description"),
            Field::DueDate => ("Due date:    ", "YYYY-MM-DD (optional)"),
            Field::Priority => ("Priority:    ", "1-5"),
            Field::Completed => ("Completed:   ", ""),
        };
        let selected = editor.focus == field;
        let mut spans = vec![Span::styled(prefix, WHITE_TEXT)];

        match editor.text(field) {
            None => {
                let value = if editor.content.completed { "Yes" } else { "No" };
                let style = if selected { BLACK_ON_WHITE } else { WHITE_TEXT };
                spans.push(Span::styled(value, style));
                if selected {
                    spans.push(Span::styled("  (space toggles)", GRAY_TEXT));
                }
            }
            Some(value) if value.is_empty() => {
                if selected {
                    // First placeholder char is highlighted as the cursor, the rest is gray
                    spans.push(Span::styled(placeholder.chars().take(1).collect::<String>(), BLACK_ON_WHITE));
                    spans.push(Span::styled(placeholder.chars().skip(1).collect::<String>(), GRAY_TEXT));
                } else {
                    spans.push(Span::styled(placeholder, GRAY_TEXT));
                }
            }
            Some(value) => {
                if selected {
                    // All chars are white, except for the one at the cursor position
                    let cursor = editor.cursor;
                    spans.push(Span::styled(value.chars().take(cursor).collect::<String>(), WHITE_TEXT));
                    spans.push(Span::styled(value.chars().skip(cursor).take(1).collect::<String>(), BLACK_ON_WHITE));
                    spans.push(Span::styled(value.chars().skip(cursor + 1).collect::<String>(), WHITE_TEXT));
                    if cursor >= value.chars().count() {
                        spans.push(Span::styled(" ", BLACK_ON_WHITE));
                    }
                } else {
                    spans.push(Span::styled(value.as_str(), WHITE_TEXT));
                }
            }
        }

        text.push(Line::from(spans));
    }

    text.push(Line::raw(""));

    if let Some(error_message) = editor.error_message() {
        text.push(Line::from(Span::styled(error_message, Style::new().fg(Color::Red))));
        text.push(Line::raw(""));
    }

    text.push(Line::from(Span::styled("Enter - save, Esc - cancel, Up/Down - move", WHITE_TEXT)));
    text
}
