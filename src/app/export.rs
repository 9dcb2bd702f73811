// Whole-snapshot CSV export of the task list
use std::io::Write;
use std::path::Path;

use crate::app::error::Result;
use crate::app::models::Task;

pub const CSV_HEADER: [&str; 6] = ["id", "title", "description", "priority", "due_date", "completed"];

// Write a header and one record per task, in the given order.
// Returns the number of task rows written.
pub fn write_csv<W: Write>(tasks: &[Task], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for task in tasks {
        csv_writer.write_record([
            task.id.map(|id| id.to_string()).unwrap_or_default(),
            task.title.clone(),
            task.description.clone(),
            task.priority.to_string(),
            task.due_date_text().unwrap_or_default(),
            task.completed_flag().to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(tasks.len())
}

pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = write_csv(tasks, file)?;
    tracing::info!(path = %path.display(), rows = written, "exported tasks to CSV");
    Ok(written)
}
