// The task record and its mapping to and from `tasks` rows
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::Row;

pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 5;

// Due dates are stored and exported as text in this exact form
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Column list shared by every SELECT, in the order `from_row` reads it
pub const TASK_COLUMNS: &str = "id, title, description, priority, due_date, completed, created_at";

const ID: usize = 0;
const TITLE: usize = 1;
const DESCRIPTION: usize = 2;
const PRIORITY: usize = 3;
const DUE_DATE: usize = 4;
const COMPLETED: usize = 5;
const CREATED_AT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: Option<NaiveDateTime>,
}

// A due date that is not a real calendar date written as YYYY-MM-DD
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid due date {0:?}, expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

impl Task {
    // A task that has not been persisted yet
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: i32,
        due_date: Option<NaiveDate>,
        completed: bool,
    ) -> Task {
        Task {
            id: None,
            title: title.into(),
            description: description.into(),
            priority,
            due_date,
            completed,
            created_at: None,
        }
    }

    pub fn due_date_text(&self) -> Option<String> {
        self.due_date.map(format_due_date)
    }

    // Storage form of the completion flag
    pub fn completed_flag(&self) -> i64 {
        i64::from(self.completed)
    }

    // Build a task from a row selected with TASK_COLUMNS.
    // A NULL description becomes an empty string.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
        let due_date = match row.get::<_, Option<String>>(DUE_DATE)? {
            Some(text) => Some(parse_due_date(&text).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(DUE_DATE, Type::Text, Box::new(e))
            })?),
            None => None,
        };

        let completed = match row.get::<_, i64>(COMPLETED)? {
            0 => false,
            1 => true,
            other => return Err(rusqlite::Error::IntegralValueOutOfRange(COMPLETED, other)),
        };

        Ok(Task {
            id: Some(row.get(ID)?),
            title: row.get(TITLE)?,
            description: row.get::<_, Option<String>>(DESCRIPTION)?.unwrap_or_default(),
            priority: row.get(PRIORITY)?,
            due_date,
            completed,
            created_at: Some(row.get(CREATED_AT)?),
        })
    }
}

pub fn format_due_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// Strict inverse of `format_due_date`: zero padding is required and nothing
// may surround the date.
pub fn parse_due_date(text: &str) -> Result<NaiveDate, InvalidDate> {
    let invalid = || InvalidDate(text.to_string());
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())?;
    if format_due_date(date) != text {
        return Err(invalid());
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn row_to_task(conn: &Connection, sql: &str) -> rusqlite::Result<Task> {
        conn.query_row(sql, [], |row| Task::from_row(row))
    }

    #[test]
    fn test_parse_due_date_accepts_iso_dates() {
        let date = parse_due_date("2025-03-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(format_due_date(date), "2025-03-10");
    }

    #[test]
    fn test_parse_due_date_rejects_other_forms() {
        for text in ["2025-3-10", "10.03.2025", "2025-02-30", "2025-03-10 ", "", "tomorrow"] {
            assert_eq!(parse_due_date(text), Err(InvalidDate(text.to_string())), "{text:?}");
        }
    }

    #[test]
    fn test_from_row_normalizes_null_description() {
        let conn = Connection::open_in_memory().unwrap();
        let task = row_to_task(
            &conn,
            "SELECT 7, 'Pay bills', NULL, 2, NULL, 0, '2025-01-01 09:30:00'",
        )
        .unwrap();

        assert_eq!(task.id, Some(7));
        assert_eq!(task.description, "");
        assert_eq!(task.due_date, None);
        assert!(!task.completed);
        assert_eq!(
            task.created_at,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 30, 0)
        );
    }

    #[test]
    fn test_from_row_reads_date_and_flag() {
        let conn = Connection::open_in_memory().unwrap();
        let task = row_to_task(
            &conn,
            "SELECT 1, 'Report', 'Quarterly', 5, '2025-03-10', 1, '2025-01-01 00:00:00'",
        )
        .unwrap();

        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert!(task.completed);
        assert_eq!(task.due_date_text().as_deref(), Some("2025-03-10"));
        assert_eq!(task.completed_flag(), 1);
    }

    #[test]
    fn test_from_row_rejects_malformed_date() {
        let conn = Connection::open_in_memory().unwrap();
        let err = row_to_task(&conn, "SELECT 1, 't', '', 3, '10/03/2025', 0, '2025-01-01 00:00:00'")
            .unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(4, Type::Text, _)));
    }

    #[test]
    fn test_from_row_rejects_unknown_completion_flag() {
        let conn = Connection::open_in_memory().unwrap();
        let err = row_to_task(&conn, "SELECT 1, 't', '', 3, NULL, 2, '2025-01-01 00:00:00'")
            .unwrap_err();
        assert!(matches!(err, rusqlite::Error::IntegralValueOutOfRange(5, 2)));
    }
}
