use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::{error::Error, io, time::Duration};

mod app;
mod config;
mod logging;

use app::error::Result;
use app::models::Task;
use app::storage::TaskRepository;

// Populate an empty store so the first start is not a blank screen
fn seed_sample_tasks(repository: &TaskRepository) -> Result<()> {
    if !repository.list_all()?.is_empty() {
        return Ok(());
    }
    let today = Local::now().date_naive();
    let samples = [
        Task::new("Welcome to TaskMaster", "Edit or delete this sample task.", 3, None, false),
        Task::new("Finish report", "Complete the quarterly report.", 4, Some(today + chrono::Duration::days(3)), false),
        Task::new("Pay bills", "Utilities and internet", 2, Some(today + chrono::Duration::days(7)), false),
    ];
    for task in &samples {
        repository.add(task)?;
    }
    Ok(())
}

// Start the app.
pub fn main() -> std::result::Result<(), Box<dyn Error>> {
    let settings = config::Settings::parse();

    // Logging is best effort; the app runs without it
    if let Err(e) = logging::init(&settings.log_path(), &settings.log_level) {
        eprintln!("taskdeck: file logging disabled: {e}");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting taskdeck");

    let repository = TaskRepository::open(settings.db_path()).map_err(|e| {
        tracing::error!(error = %e, "failed to open task repository");
        e
    })?;
    if !settings.no_samples {
        if let Err(e) = seed_sample_tasks(&repository) {
            tracing::error!(error = %e, "failed to insert sample tasks");
        }
    }
    let app = app::ui::App::new(&repository)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create an app with 250 ms tick
    let tick_rate = Duration::from_millis(250);
    let res = app::ui::run_app(&mut terminal, app, tick_rate);

    // Restore previous terminal state after exit
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("{err:?}");
    }

    repository.close()?;
    tracing::info!("exiting taskdeck");
    Ok(())
}
