// Communication with SQLite
// Philosophy of CRUD lives here
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::app::error::{Error, Result};
use crate::app::models::{Task, TASK_COLUMNS};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    priority INTEGER NOT NULL,
    due_date TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);";

// Open work first, then most urgent, then dated before undated, earliest date first
const ORDER_BY: &str = "ORDER BY completed, priority DESC, due_date IS NULL, due_date, id";

// Sole reader and writer of the task table.
// Owns one connection for its whole life. Every statement commits on its own;
// the repository does not validate task fields, its callers do.
#[derive(Debug)]
pub struct TaskRepository {
    db_con: Connection,
    db_path: PathBuf,
}

impl TaskRepository {
    // Open (creating if missing) the database file and make sure the schema exists.
    pub fn open(db_path: impl AsRef<Path>) -> Result<TaskRepository> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let repository = TaskRepository {
            db_con: Connection::open(&db_path)?,
            db_path,
        };
        repository.ensure_schema()?;
        tracing::info!(path = %repository.db_path.display(), "task repository initialized");
        Ok(repository)
    }

    // Safe to run on every startup
    pub fn ensure_schema(&self) -> Result<()> {
        self.db_con.execute_batch(SCHEMA)?;
        Ok(())
    }

    // CREATE
    pub fn add(&self, task: &Task) -> Result<i64> {
        if let Some(id) = task.id {
            return Err(Error::InvalidArgument(format!(
                "task already has id {id}, use update instead"
            )));
        }

        self.db_con.execute(
            "INSERT INTO tasks (title, description, priority, due_date, completed) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.title,
                task.description,
                task.priority,
                task.due_date_text(),
                task.completed_flag()
            ],
        )?;
        let id = self.db_con.last_insert_rowid();
        tracing::info!(id, title = %task.title, "added task");
        Ok(id)
    }

    // UPDATE
    // An id that no longer exists matches zero rows and is not reported as an error.
    pub fn update(&self, task: &Task) -> Result<()> {
        let id = task
            .id
            .ok_or_else(|| Error::InvalidArgument("task id is required for update".into()))?;

        let changed = self.db_con.execute(
            "UPDATE tasks SET title = ?1, description = ?2, priority = ?3, due_date = ?4, completed = ?5 WHERE id = ?6",
            params![
                task.title,
                task.description,
                task.priority,
                task.due_date_text(),
                task.completed_flag(),
                id
            ],
        )?;
        if changed == 0 {
            tracing::warn!(id, "update matched no task");
        } else {
            tracing::info!(id, title = %task.title, "updated task");
        }
        Ok(())
    }

    // DELETE
    pub fn delete(&self, id: i64) -> Result<()> {
        let removed = self.db_con.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        tracing::info!(id, removed, "deleted task");
        Ok(())
    }

    // READ
    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        let task = self
            .db_con
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                |row| Task::from_row(row),
            )
            .optional()?;
        Ok(task)
    }

    pub fn list_all(&self) -> Result<Vec<Task>> {
        self.search(None, None, None)
    }

    // All filters are optional and combined with AND.
    // `text` is a case-insensitive substring of the title or the description.
    pub fn search(
        &self,
        text: Option<&str>,
        priority: Option<i32>,
        show_completed: Option<bool>,
    ) -> Result<Vec<Task>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(text) = text.filter(|t| !t.is_empty()) {
            conditions.push(r"(title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')");
            let pattern = format!("%{}%", escape_like(text));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        if let Some(priority) = priority {
            conditions.push("priority = ?");
            values.push(Value::Integer(i64::from(priority)));
        }

        if let Some(completed) = show_completed {
            conditions.push("completed = ?");
            values.push(Value::Integer(i64::from(completed)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks {where_clause} {ORDER_BY}");

        let mut stmt = self.db_con.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_from_iter(values), |row| Task::from_row(row))?
            .collect::<rusqlite::Result<Vec<Task>>>()?;
        Ok(tasks)
    }

    // Releases the connection; the repository is gone afterwards
    pub fn close(self) -> Result<()> {
        let path = self.db_path;
        self.db_con.close().map_err(|(_, e)| Error::Database(e))?;
        tracing::info!(path = %path.display(), "task repository closed");
        Ok(())
    }
}

// Make LIKE wildcards in user text match literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repository() -> (TempDir, TaskRepository) {
        let dir = TempDir::new().unwrap();
        let repository = TaskRepository::open(dir.path().join("tasks.db")).unwrap();
        (dir, repository)
    }

    fn date(text: &str) -> Option<NaiveDate> {
        Some(NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap())
    }

    fn add(repository: &TaskRepository, title: &str, priority: i32, due: Option<&str>, completed: bool) -> i64 {
        let task = Task::new(title, "", priority, due.and_then(date), completed);
        repository.add(&task).unwrap()
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_add_and_get_task() {
        let (_dir, repository) = create_test_repository();
        let task = Task::new("Finish report", "Quarterly numbers", 4, date("2025-03-10"), true);

        let id = repository.add(&task).unwrap();
        let fetched = repository.get(id).unwrap().unwrap();

        assert_eq!(fetched.id, Some(id));
        assert!(fetched.created_at.is_some());
        assert_eq!(Task { id: None, created_at: None, ..fetched }, task);
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let (_dir, repository) = create_test_repository();
        let first = add(&repository, "one", 3, None, false);
        let second = add(&repository, "two", 3, None, false);
        assert!(second > first);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "one", 3, None, false);
        let second = add(&repository, "two", 3, None, false);
        repository.delete(second).unwrap();

        let third = add(&repository, "three", 3, None, false);
        assert!(third > second);
    }

    #[test]
    fn test_add_rejects_task_with_id() {
        let (_dir, repository) = create_test_repository();
        let mut task = Task::new("t", "", 3, None, false);
        task.id = Some(12);

        let err = repository.add(&task).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(repository.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_replaces_fields() {
        let (_dir, repository) = create_test_repository();
        let id = add(&repository, "Draft", 2, None, false);
        let before = repository.get(id).unwrap().unwrap();

        let updated = Task {
            title: "Final".into(),
            description: "now with details".into(),
            priority: 5,
            due_date: date("2025-12-31"),
            completed: true,
            ..before.clone()
        };
        repository.update(&updated).unwrap();

        let after = repository.get(id).unwrap().unwrap();
        assert_eq!(after, updated);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_update_without_id_is_invalid_argument() {
        let (_dir, repository) = create_test_repository();
        let err = repository.update(&Task::new("t", "", 3, None, false)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let (_dir, repository) = create_test_repository();
        let mut task = Task::new("ghost", "", 3, None, false);
        task.id = Some(404);

        repository.update(&task).unwrap();
        assert!(repository.get(404).unwrap().is_none());
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let (_dir, repository) = create_test_repository();
        let id = add(&repository, "t", 3, None, false);

        repository.delete(id).unwrap();
        assert!(repository.get(id).unwrap().is_none());
        repository.delete(id).unwrap();
    }

    #[test]
    fn test_get_nonexistent_task() {
        let (_dir, repository) = create_test_repository();
        assert!(repository.get(1).unwrap().is_none());
    }

    #[test]
    fn test_list_all_orders_open_before_completed_then_priority() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "done-5", 5, None, true);
        add(&repository, "open-1", 1, None, false);
        add(&repository, "open-5", 5, None, false);

        let tasks = repository.list_all().unwrap();
        assert_eq!(titles(&tasks), ["open-5", "open-1", "done-5"]);
    }

    #[test]
    fn test_list_all_orders_dated_before_undated() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "undated", 3, None, false);
        add(&repository, "later", 3, Some("2025-06-01"), false);
        add(&repository, "sooner", 3, Some("2025-01-01"), false);

        let tasks = repository.list_all().unwrap();
        assert_eq!(titles(&tasks), ["sooner", "later", "undated"]);
    }

    #[test]
    fn test_search_text_matches_title_or_description() {
        let (_dir, repository) = create_test_repository();
        repository.add(&Task::new("Finish report", "", 3, None, false)).unwrap();
        repository.add(&Task::new("Email Bob", "attach the REPORT", 2, None, false)).unwrap();
        repository.add(&Task::new("Pay bills", "utilities", 4, None, false)).unwrap();

        let tasks = repository.search(Some("report"), None, None).unwrap();
        assert_eq!(titles(&tasks), ["Finish report", "Email Bob"]);
    }

    #[test]
    fn test_search_priority_and_status() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "open-4", 4, None, false);
        add(&repository, "done-4", 4, None, true);
        add(&repository, "open-3", 3, None, false);

        let tasks = repository.search(None, Some(4), Some(false)).unwrap();
        assert_eq!(titles(&tasks), ["open-4"]);

        let done = repository.search(None, None, Some(true)).unwrap();
        assert_eq!(titles(&done), ["done-4"]);
    }

    #[test]
    fn test_search_without_filters_matches_list_all() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "a", 1, Some("2025-02-01"), true);
        add(&repository, "b", 5, None, false);
        add(&repository, "c", 5, Some("2025-02-01"), false);

        let listed = repository.list_all().unwrap();
        assert_eq!(repository.search(None, None, None).unwrap(), listed);
        assert_eq!(repository.search(Some(""), None, None).unwrap(), listed);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let (_dir, repository) = create_test_repository();
        add(&repository, "100% done", 3, None, false);
        add(&repository, "1000 lines", 3, None, false);
        add(&repository, "snake_case", 3, None, false);
        add(&repository, "snakeXcase", 3, None, false);

        assert_eq!(titles(&repository.search(Some("0%"), None, None).unwrap()), ["100% done"]);
        assert_eq!(titles(&repository.search(Some("e_c"), None, None).unwrap()), ["snake_case"]);
    }

    #[test]
    fn test_null_description_reads_as_empty() {
        let (_dir, repository) = create_test_repository();
        repository
            .db_con
            .execute("INSERT INTO tasks (title, priority) VALUES ('bare', 3)", [])
            .unwrap();

        let tasks = repository.list_all().unwrap();
        assert_eq!(tasks[0].description, "");
        assert!(!tasks[0].completed);
    }

    #[test]
    fn test_add_and_update_after_table_dropped_are_database_errors() {
        let (_dir, repository) = create_test_repository();
        let id = add(&repository, "t", 3, None, false);
        let mut task = repository.get(id).unwrap().unwrap();
        repository.db_con.execute_batch("DROP TABLE tasks").unwrap();

        let err = repository.add(&Task::new("new", "", 3, None, false)).unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        task.completed = true;
        assert!(matches!(repository.update(&task), Err(Error::Database(_))));
        assert!(matches!(repository.delete(id), Err(Error::Database(_))));
    }

    #[test]
    fn test_get_on_unreadable_row_is_error_not_absence() {
        let (_dir, repository) = create_test_repository();
        let id = add(&repository, "t", 3, Some("2025-03-10"), false);
        repository
            .db_con
            .execute("UPDATE tasks SET due_date = '3/10/2025' WHERE id = ?1", [id])
            .unwrap();

        assert!(matches!(repository.get(id), Err(Error::Database(_))));
        assert!(matches!(repository.list_all(), Err(Error::Database(_))));
        assert!(matches!(repository.get(id + 1), Ok(None)));
    }

    #[test]
    fn test_ensure_schema_is_idempotent_and_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.db");

        let repository = TaskRepository::open(&path).unwrap();
        repository.ensure_schema().unwrap();
        let id = add(&repository, "persisted", 3, None, false);
        repository.close().unwrap();

        let reopened = TaskRepository::open(&path).unwrap();
        assert_eq!(reopened.db_path, path);
        assert_eq!(reopened.get(id).unwrap().unwrap().title, "persisted");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
