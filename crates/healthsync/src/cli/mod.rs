//! Command-line surface shared by the `healthsync` binary

pub mod commands;

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{ensure_dir, PipelineConfig};
use crate::error::{HealthError, Result};
use crate::storage::HealthDb;

/// Output format for query commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Overrides taken from flags and environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub exports: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Load the config file (explicit or default) and apply the overrides
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::load_default()?,
        };
        if let Some(db) = &self.db {
            config.database = Some(db.clone());
        }
        if let Some(exports) = &self.exports {
            config.exports_dir = exports.clone();
        }
        Ok(config)
    }
}

/// Open the configured database, creating its directory when needed
pub fn open_db(config: &PipelineConfig) -> Result<HealthDb> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    HealthDb::open(&path)
}

/// Open the configured database only if it already exists
pub fn open_existing_db(config: &PipelineConfig) -> Result<Option<(PathBuf, HealthDb)>> {
    let path = config.database_path()?;
    if !Path::new(&path).exists() {
        println!("No database found at: {}", path.display());
        println!("Run 'healthsync sync run' to create one.");
        return Ok(None);
    }
    let db = HealthDb::open(&path)?;
    Ok(Some((path, db)))
}

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| HealthError::InvalidDateFormat(s.to_string()))
}

/// Print records as pretty JSON
pub fn print_json<T: Serialize>(records: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

/// Write records as CSV with a header row to stdout
pub fn print_csv<T: Serialize>(records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(matches!(
            parse_date("06/01/2024"),
            Err(HealthError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(&config_path, "exports_dir = \"/from/file\"\nnote_policy = \"strict\"\n").unwrap();

        let overrides = ConfigOverrides {
            config: Some(config_path),
            db: Some(temp.path().join("health.db")),
            exports: Some(PathBuf::from("/from/flag")),
        };
        let config = overrides.resolve().unwrap();

        assert_eq!(config.exports_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.database_path().unwrap(), temp.path().join("health.db"));
        assert_eq!(config.note_policy, crate::config::NotePolicy::Strict);
    }

    #[test]
    fn test_open_db_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig {
            database: Some(temp.path().join("nested").join("health.db")),
            ..PipelineConfig::default()
        };

        open_db(&config).unwrap();
        assert!(temp.path().join("nested").join("health.db").exists());
    }
}
