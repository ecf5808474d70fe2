//! Run decision against the last recorded watermark

use std::fmt;

use chrono::{DateTime, Utc};

use crate::db::models::RunWatermark;

use super::exports::{ExportCategory, ExportFiles};

/// What the controller found when comparing exports to the watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// No run was ever recorded; everything is processed
    NoPriorRun,
    /// No export changed since the watermark
    UpToDate { watermark: RunWatermark },
    /// At least one category has a file newer than the watermark
    NewDataPending {
        watermark: RunWatermark,
        changed: Vec<ExportCategory>,
    },
}

impl RunState {
    /// Compare each category's newest file against the latest watermark
    ///
    /// A file counts as changed only when it is strictly newer.
    pub fn decide(watermark: Option<&RunWatermark>, files: &ExportFiles) -> Self {
        let Some(watermark) = watermark else {
            return RunState::NoPriorRun;
        };

        let changed: Vec<ExportCategory> = ExportCategory::ALL
            .into_iter()
            .filter(|category| {
                files
                    .newest(*category)
                    .map(|modified| DateTime::<Utc>::from(modified) > watermark.timestamp)
                    .unwrap_or(false)
            })
            .collect();

        if changed.is_empty() {
            RunState::UpToDate {
                watermark: *watermark,
            }
        } else {
            RunState::NewDataPending {
                watermark: *watermark,
                changed,
            }
        }
    }

    pub fn needs_run(&self) -> bool {
        !matches!(self, RunState::UpToDate { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NoPriorRun => write!(f, "no prior run, full pass required"),
            RunState::UpToDate { watermark } => {
                write!(f, "up to date (last run {})", watermark.timestamp.to_rfc3339())
            }
            RunState::NewDataPending { watermark, changed } => {
                let names: Vec<String> = changed.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "new data since {}: {}",
                    watermark.timestamp.to_rfc3339(),
                    names.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn exports_with_strong(modified: SystemTime) -> (TempDir, ExportFiles) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("strong.csv");
        fs::write(&path, "Date,Exercise Name\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let files = ExportFiles::discover(temp.path()).unwrap();
        (temp, files)
    }

    fn watermark_at(at: SystemTime) -> RunWatermark {
        RunWatermark::new(DateTime::<Utc>::from(at))
    }

    #[test]
    fn test_no_watermark_means_full_pass() {
        let (_temp, files) = exports_with_strong(SystemTime::now());
        assert_eq!(RunState::decide(None, &files), RunState::NoPriorRun);
    }

    #[test]
    fn test_newer_file_is_pending() {
        let now = SystemTime::now();
        let (_temp, files) = exports_with_strong(now);
        let watermark = watermark_at(now - Duration::from_secs(3600));

        let state = RunState::decide(Some(&watermark), &files);

        assert_eq!(
            state,
            RunState::NewDataPending {
                watermark,
                changed: vec![ExportCategory::Strength],
            }
        );
        assert!(state.needs_run());
    }

    #[test]
    fn test_file_at_watermark_is_not_newer() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_717_200_000);
        let (_temp, files) = exports_with_strong(at);
        let watermark = watermark_at(at);

        let state = RunState::decide(Some(&watermark), &files);

        assert_eq!(state, RunState::UpToDate { watermark });
        assert!(!state.needs_run());
    }

    #[test]
    fn test_missing_files_never_trigger_a_run() {
        let temp = TempDir::new().unwrap();
        let files = ExportFiles::discover(temp.path()).unwrap();
        let watermark = RunWatermark::epoch();

        assert!(!RunState::decide(Some(&watermark), &files).needs_run());
    }
}
