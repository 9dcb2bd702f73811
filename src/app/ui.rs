use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, widgets::*};
use std::{
    io,
    path::Path,
    time::{Duration, Instant},
};

use crate::app::error::Result;
use crate::app::export::export_csv;
use crate::app::search::{get_search_ui, SearchForm, SearchOutcome};
use crate::app::storage::TaskRepository;
use crate::app::{task_edit::*, task_list::*};

pub const DEFAULT_EXPORT_PATH: &str = "tasks.csv";

// What the keyboard is currently talking to
pub enum Mode {
    Browse,
    Editing(TaskEditor),
    Searching(SearchForm),
    ConfirmDelete { id: i64, title: String },
    Exporting(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

// Message box contents; any key dismisses it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    fn info(text: impl Into<String>) -> Message {
        Message {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Message {
        Message {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }
}

pub struct App<'a> {
    pub items: TaskList<'a>,
    pub mode: Mode,
    pub message: Option<Message>,
    repository: &'a TaskRepository,
}

impl<'a> App<'a> {
    pub fn new(repository: &'a TaskRepository) -> Result<App<'a>> {
        Ok(App {
            items: TaskList::with_items_from_storage(repository)?,
            mode: Mode::Browse,
            message: None,
            repository,
        })
    }

    // Returns false once the user asked to quit
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        if self.message.take().is_some() {
            return true;
        }

        if matches!(self.mode, Mode::Browse) {
            return self.handle_browse_key(key);
        }

        match &mut self.mode {
            Mode::Browse => {}
            Mode::Editing(editor) => {
                if let Some(outcome) = editor.handle_key(key) {
                    self.mode = Mode::Browse;
                    self.finish_edit(outcome);
                }
            }
            Mode::Searching(form) => {
                if let Some(outcome) = form.handle_key(key) {
                    self.mode = Mode::Browse;
                    if let SearchOutcome::Apply(filter) = outcome {
                        let result = self.items.set_filter(filter);
                        self.report("Search", result);
                    }
                }
            }
            Mode::ConfirmDelete { id, .. } => {
                let id = *id;
                self.mode = Mode::Browse;
                if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    let result = self.repository.delete(id);
                    self.report("Delete", result);
                    self.refresh();
                }
            }
            Mode::Exporting(path) => match key {
                KeyCode::Esc => self.mode = Mode::Browse,
                KeyCode::Backspace => {
                    path.pop();
                }
                KeyCode::Char(c) => path.push(c),
                KeyCode::Enter => {
                    let path = path.trim().to_string();
                    self.mode = Mode::Browse;
                    if !path.is_empty() {
                        self.export(Path::new(&path));
                    }
                }
                _ => {}
            },
        }
        true
    }

    // Handle input for the task list navigation and actions
    fn handle_browse_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return false,
            KeyCode::Down => self.items.next(),
            KeyCode::Up => self.items.previous(),
            KeyCode::Left => self.items.unselect(),
            KeyCode::Char('a') => self.mode = Mode::Editing(TaskEditor::new_task()),
            KeyCode::Char('e') => self.open_editor_for_selected(),
            KeyCode::Char('x') => {
                if let Some(task) = self.items.get_selected() {
                    if let Some(id) = task.id {
                        self.mode = Mode::ConfirmDelete {
                            id,
                            title: task.title.clone(),
                        };
                    }
                } else {
                    self.message = Some(Message::info("Select a task to delete."));
                }
            }
            KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('/') => self.mode = Mode::Searching(SearchForm::new(self.items.filter())),
            KeyCode::Char('r') => {
                let result = self.items.set_filter(Default::default());
                self.report("Refresh", result);
            }
            KeyCode::Char('s') => self.mode = Mode::Exporting(DEFAULT_EXPORT_PATH.to_string()),
            _ => {}
        }
        true
    }

    fn selected_id(&self) -> Option<i64> {
        self.items.get_selected().and_then(|task| task.id)
    }

    // The editor always starts from the stored task, not the row on screen
    fn open_editor_for_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            self.message = Some(Message::info("Select a task to edit."));
            return;
        };
        match self.repository.get(id) {
            Ok(Some(task)) => self.mode = Mode::Editing(TaskEditor::edit_task(&task)),
            Ok(None) => {
                self.message = Some(Message::error("Task not found."));
                self.refresh();
            }
            Err(e) => self.report("Edit", Err(e)),
        }
    }

    // One repository call per saved form, then re-query
    fn finish_edit(&mut self, outcome: EditorOutcome) {
        let EditorOutcome::Save(task) = outcome else {
            return;
        };
        if task.id.is_some() {
            match self.repository.update(&task) {
                Ok(()) => self.message = Some(Message::info("Task updated.")),
                Err(e) => self.report("Update", Err(e)),
            }
        } else {
            match self.repository.add(&task) {
                Ok(_) => self.message = Some(Message::info("Task added.")),
                Err(e) => self.report("Add", Err(e)),
            }
        }
        self.refresh();
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            self.message = Some(Message::info("Select a task."));
            return;
        };
        match self.repository.get(id) {
            Ok(Some(mut task)) => {
                task.completed = !task.completed;
                let result = self.repository.update(&task);
                self.report("Toggle", result);
            }
            Ok(None) => self.message = Some(Message::error("Task not found.")),
            Err(e) => self.report("Toggle", Err(e)),
        }
        self.refresh();
    }

    // Exports every task regardless of the active filter
    fn export(&mut self, path: &Path) {
        let result = self
            .repository
            .list_all()
            .and_then(|tasks| export_csv(&tasks, path));
        match result {
            Ok(_) => {
                self.message = Some(Message::info(format!("Tasks exported to {}", path.display())))
            }
            Err(e) => self.report("Export", Err(e)),
        }
    }

    fn refresh(&mut self) {
        let result = self.items.update_items();
        self.report("Refresh", result);
    }

    // Log a failed action and show it. Within one key press the first error
    // stays on screen.
    fn report(&mut self, action: &str, result: Result<()>) {
        if let Err(e) = result {
            tracing::error!(action, error = %e, "action failed");
            if !matches!(&self.message, Some(m) if m.kind == MessageKind::Error) {
                self.message = Some(Message::error(format!("{action} failed: {e}")));
            }
        }
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

// Rectangle of the given size centered in `area`, clipped to it
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_popup(f: &mut Frame, title: &str, lines: Vec<Line>, color: Color) {
    let area = centered_rect(60, lines.len() as u16 + 2, f.size());
    let popup = Paragraph::new(lines)
        .block(Block::new().title(title.to_string()).borders(Borders::ALL))
        .style(Style::new().fg(color))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

// Draws the whole user interface
fn draw_ui(f: &mut Frame, app: &mut App) {
    // Create two chunks of screen in 60-40 ratio
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(f.size());

    // DRAW LEFT PART
    let filter = app.items.filter().describe();
    let list_title = if filter.is_empty() {
        "Tasks".to_string()
    } else {
        format!("Tasks - {filter}")
    };
    let task_list = List::new(get_list_items_ui(app.items.items.as_slice()))
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(task_list, chunks[0], &mut app.items.state);

    // DRAW RIGHT PART
    match &app.mode {
        Mode::Editing(editor) => {
            let title = if editor.is_new() { "New Task" } else { "Edit Task" };
            let form = Paragraph::new(get_task_edit_ui(editor))
                .block(Block::new().title(title).borders(Borders::ALL))
                .style(Style::new().white())
                .wrap(Wrap { trim: false });
            f.render_widget(form, chunks[1]);
        }
        Mode::Searching(form) => {
            let search = Paragraph::new(get_search_ui(form))
                .block(Block::new().title("Search").borders(Borders::ALL))
                .style(Style::new().white());
            f.render_widget(search, chunks[1]);
        }
        Mode::Exporting(path) => {
            let prompt = Paragraph::new(vec![
                Line::from("File:"),
                Line::from(vec![
                    Span::from(path.as_str()),
                    Span::styled(" ", Style::new().bg(Color::White)),
                ]),
                Line::raw(""),
                Line::from("Enter - export, Esc - cancel"),
            ])
            .block(Block::new().title("Export CSV").borders(Borders::ALL))
            .style(Style::new().white());
            f.render_widget(prompt, chunks[1]);
        }
        Mode::Browse | Mode::ConfirmDelete { .. } => {
            // Statistics and instructions in vertically split layout
            let right_side = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let instructions = Paragraph::new(get_instructions_ui())
                .block(Block::new().title("Commands").borders(Borders::ALL))
                .style(Style::new().white());

            let today = chrono::Local::now().date_naive();
            let statistics = Paragraph::new(get_statistics_ui(app.items.statistics(today)))
                .block(Block::new().title("Statistics").borders(Borders::ALL))
                .style(Style::new().white());

            f.render_widget(instructions, right_side[0]);
            f.render_widget(statistics, right_side[1]);
        }
    }

    // POPUPS
    if let Mode::ConfirmDelete { title, .. } = &app.mode {
        let lines = vec![
            Line::from(format!("Delete \"{title}\"?")),
            Line::from("y - delete, any other key - keep"),
        ];
        render_popup(f, "Confirm", lines, Color::Yellow);
    }

    if let Some(message) = &app.message {
        let (title, color) = match message.kind {
            MessageKind::Info => ("Info", Color::White),
            MessageKind::Error => ("Error", Color::Red),
        };
        let lines = vec![Line::from(message.text.as_str()), Line::from("press any key")];
        render_popup(f, title, lines, color);
    }
}
