//! Pipeline configuration loaded from `config.toml`
//!
//! Every key is optional; missing keys fall back to [`PipelineConfig::default`].
//! CLI flags override whatever the file provides.
//!
//! ```toml
//! exports_dir = "~/health/data_exports"
//! database = "~/health/health.db"
//! wearable_sources = ["Apple Watch"]
//! strength_workout_type = "TraditionalStrengthTraining"
//! overwrite_existing_sessions = false
//! note_policy = "first-wins"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "health.db";

/// How the exertion extractor treats an exercise group carrying several distinct notes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotePolicy {
    /// Consult the first note, log a warning about the rest
    #[default]
    FirstWins,
    /// Refuse to guess and fail the workout load
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the raw export files
    pub exports_dir: PathBuf,
    /// SQLite database path; `None` means the platform data directory
    pub database: Option<PathBuf>,
    /// Source-name fragments identifying the higher-priority wearable tier
    pub wearable_sources: Vec<String>,
    /// Workout type that strength-log sets attach to
    pub strength_workout_type: String,
    /// Rewrite duration/distance/energy of sessions that are already stored
    pub overwrite_existing_sessions: bool,
    pub note_policy: NotePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            exports_dir: PathBuf::from("data_exports"),
            database: None,
            wearable_sources: vec!["Apple Watch".to_string()],
            strength_workout_type: "TraditionalStrengthTraining".to_string(),
            overwrite_existing_sessions: false,
            note_policy: NotePolicy::FirstWins,
        }
    }
}

impl PipelineConfig {
    /// Load from the default location, falling back to defaults when no file exists
    pub fn load_default() -> Result<Self> {
        let path = super::config_dir()?.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load from an explicit TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HealthError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| HealthError::config(format!("Invalid config.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.wearable_sources.iter().any(|s| s.trim().is_empty()) {
            return Err(HealthError::config("wearable_sources must not contain empty names"));
        }
        if self.strength_workout_type.trim().is_empty() {
            return Err(HealthError::config("strength_workout_type must not be empty"));
        }
        Ok(())
    }

    /// Resolve the database path, defaulting to `<data_dir>/health.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(super::data_dir()?.join(DATABASE_FILENAME)),
        }
    }
}
