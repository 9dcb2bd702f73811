// Error types for the task store and the actions built on top of it

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Connection, constraint, disk I/O or row conversion
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // The caller passed a task that does not fit the operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
