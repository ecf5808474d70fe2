use std::path::Path;

use thiserror::Error;

/// Main error type for healthsync
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Could not read source {path}: {message}")]
    SourceRead { path: String, message: String },

    #[error("Unparseable field {field}: {value:?}")]
    ParseField { field: &'static str, value: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exercise '{exercise}' on {session} has {count} distinct notes")]
    AmbiguousNotes {
        session: String,
        exercise: String,
        count: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HealthError>;

impl HealthError {
    /// Create a source read error for a file
    pub fn source_read(path: &Path, msg: impl ToString) -> Self {
        Self::SourceRead {
            path: path.display().to_string(),
            message: msg.to_string(),
        }
    }

    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a database error with context
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Database(format!("{}: {}", context, err))
    }

    /// Whether a parser may swallow this error and degrade to an empty result
    pub fn is_recoverable_source_error(&self) -> bool {
        matches!(
            self,
            Self::SourceRead { .. }
                | Self::Io(_)
                | Self::Csv(_)
                | Self::Xml(_)
                | Self::Spreadsheet(_)
        )
    }
}

/// Render an error as a single line for the terminal
pub fn format_user_error(err: &HealthError) -> String {
    match err {
        HealthError::Database(msg) => format!(
            "{}\nNothing was recorded for this run; fix the problem and run 'healthsync sync run' again.",
            msg
        ),
        HealthError::AmbiguousNotes { .. } => format!(
            "{}\nSet note_policy = \"first-wins\" in config.toml to accept the first note.",
            err
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HealthError::Database("disk full".to_string());
        assert_eq!(err.to_string(), "Database error: disk full");
    }

    #[test]
    fn test_source_read_error() {
        let err = HealthError::source_read(Path::new("/tmp/strong.csv"), "No such file");
        assert!(err.to_string().contains("/tmp/strong.csv"));
        assert!(err.is_recoverable_source_error());
    }

    #[test]
    fn test_database_error_is_not_recoverable() {
        let err = HealthError::database("Failed to upsert", "constraint failed");
        assert!(!err.is_recoverable_source_error());
        assert!(err.to_string().contains("Failed to upsert: constraint failed"));
    }

    #[test]
    fn test_invalid_date_format_error() {
        let err = HealthError::InvalidDateFormat("not-a-date".to_string());
        assert!(err.to_string().contains("not-a-date"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_format_user_error_mentions_retry() {
        let err = HealthError::Database("locked".to_string());
        assert!(format_user_error(&err).contains("sync run"));
    }
}
