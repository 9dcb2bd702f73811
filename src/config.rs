// Command line and environment settings

use clap::Parser;
use std::path::{Path, PathBuf};

pub const DB_FILENAME: &str = "tasks.db";
pub const LOG_FILENAME: &str = "taskdeck.log";

/// Terminal task manager backed by a local SQLite file.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskdeck", version)]
pub struct Settings {
    /// Database file [default: tasks.db next to the executable]
    #[arg(long = "db", env = "TASKDECK_DB", value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Log file [default: taskdeck.log next to the executable]
    #[arg(long = "log-file", env = "TASKDECK_LOG", value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Minimum log level, overridden by RUST_LOG
    #[arg(long, env = "TASKDECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Do not add sample tasks to an empty database
    #[arg(long)]
    pub no_samples: bool,
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| app_dir().join(DB_FILENAME))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| app_dir().join(LOG_FILENAME))
    }
}

// Directory of the running executable, or the current directory if unknown
fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths() {
        let settings = Settings::try_parse_from([
            "taskdeck",
            "--db",
            "/tmp/a.db",
            "--log-file",
            "/tmp/a.log",
            "--log-level",
            "debug",
            "--no-samples",
        ])
        .unwrap();

        assert_eq!(settings.db_path(), PathBuf::from("/tmp/a.db"));
        assert_eq!(settings.log_path(), PathBuf::from("/tmp/a.log"));
        assert_eq!(settings.log_level, "debug");
        assert!(settings.no_samples);
    }

    #[test]
    fn test_default_paths_sit_next_to_each_other() {
        let settings = Settings {
            db_path: None,
            log_path: None,
            log_level: "info".into(),
            no_samples: false,
        };

        let db = settings.db_path();
        let log = settings.log_path();
        assert_eq!(db.file_name().unwrap(), DB_FILENAME);
        assert_eq!(log.file_name().unwrap(), LOG_FILENAME);
        assert_eq!(db.parent(), log.parent());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Settings::try_parse_from(["taskdeck", "--verbose"]).is_err());
    }
}
