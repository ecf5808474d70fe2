//! Pipeline settings and the per-user locations they default to
//!
//! `config.toml` is read from [`config_dir`]; when it names no `database`, the
//! SQLite file is `health.db` under [`data_dir`].

mod pipeline;

pub use pipeline::{NotePolicy, PipelineConfig};

use crate::error::{HealthError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "healthsync";

/// Directory holding `config.toml`, e.g. `~/.config/healthsync`
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_DIR))
        .ok_or_else(|| HealthError::config("Could not determine config directory"))
}

/// Directory holding the default `health.db`, e.g. `~/.local/share/healthsync`
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(APP_DIR))
        .ok_or_else(|| HealthError::config("Could not determine data directory"))
}

/// Create `path` and its parents if missing
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_dirs_are_namespaced() {
        assert!(config_dir().unwrap().ends_with("healthsync"));
        assert!(data_dir().unwrap().ends_with("healthsync"));
    }

    #[test]
    fn test_default_database_lives_in_data_dir() {
        let path = PipelineConfig::default().database_path().unwrap();
        assert_eq!(path, data_dir().unwrap().join("health.db"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
