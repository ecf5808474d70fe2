//! Sync module for turning raw health exports into the unified store
//!
//! Provides:
//! - Export discovery and modification-time checks against the last run
//! - Daily sub-pipeline: dedup, aggregation, nutrition union, merge, upsert
//! - Workout sub-pipeline: exertion extraction and session reconciliation
//!
//! The watermark is appended only after both sub-pipelines have committed.

pub mod exports;
pub mod watermark;

use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::db::models::{DailySummary, RunWatermark};
use crate::models::{ActivitySample, DailyMetricRow, Metric};
use crate::sources::{self, apple_health, nutrition, strength, NutritionFile};
use crate::storage::{HealthDb, ReconcilePolicy, ReconcileStats};
use crate::unify::{
    aggregate_daily, daily_strength_volume, deduplicate, merge_daily, ExertionExtractor,
};
use crate::Result;

pub use exports::{ExportCategory, ExportFile, ExportFiles};
pub use watermark::RunState;

/// Options for a sync run
#[derive(Debug, Default, Clone)]
pub struct SyncOptions {
    /// Process even when no export is newer than the watermark
    pub force: bool,
    /// Decide and report only; write nothing
    pub dry_run: bool,
}

/// Statistics from a completed run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStats {
    /// Step samples before and after device deduplication
    pub step_samples: usize,
    pub step_samples_kept: usize,
    pub energy_samples: usize,
    pub nutrition_files: usize,
    pub strength_sets: usize,
    /// Source records skipped because a required field did not parse
    pub dropped_records: usize,
    pub days_written: usize,
    pub workouts: ReconcileStats,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Days: {}, Step samples: {} of {} kept, Strength sets: {}, Nutrition files: {}",
            self.days_written,
            self.step_samples_kept,
            self.step_samples,
            self.strength_sets,
            self.nutrition_files
        )?;
        if self.dropped_records > 0 {
            write!(f, ", Dropped: {}", self.dropped_records)?;
        }
        write!(f, "\nWorkouts: {}", self.workouts)
    }
}

/// How a run ended without error
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Nothing changed since the last run
    UpToDate { watermark: RunWatermark },
    /// `dry_run` was set; carries the decision that would have been acted on
    DryRun { state: RunState },
    /// Both sub-pipelines committed and a new watermark was recorded
    Completed {
        stats: SyncStats,
        watermark: RunWatermark,
        /// Categories with no export file; their metrics were left empty
        missing: Vec<ExportCategory>,
    },
}

impl SyncOutcome {
    pub fn missing_sources(&self) -> &[ExportCategory] {
        match self {
            SyncOutcome::Completed { missing, .. } => missing,
            _ => &[],
        }
    }
}

/// Everything read from the exports for one run
#[derive(Debug, Default)]
struct SourceData {
    health: apple_health::AppleHealthExport,
    strength: strength::StrengthLog,
    nutrition: Vec<NutritionFile>,
}

/// Sync engine orchestrating the incremental pipeline
pub struct SyncEngine {
    db: HealthDb,
    config: PipelineConfig,
}

impl SyncEngine {
    /// Create an engine over an open database
    pub fn new(db: HealthDb, config: PipelineConfig) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &HealthDb {
        &self.db
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compare the exports to the last recorded run without processing
    pub fn plan(&self) -> Result<(RunState, ExportFiles)> {
        let files = ExportFiles::discover(&self.config.exports_dir)?;
        let watermark = self.db.latest_watermark()?;
        let state = RunState::decide(watermark.as_ref(), &files);
        Ok((state, files))
    }

    /// Run the pipeline if any export changed since the last run
    pub fn run(&mut self, opts: &SyncOptions) -> Result<SyncOutcome> {
        let (state, files) = self.plan()?;
        info!(state = %state, force = opts.force, "Checked exports against last run");

        if opts.dry_run {
            return Ok(SyncOutcome::DryRun { state });
        }
        if let RunState::UpToDate { watermark } = state {
            if !opts.force {
                return Ok(SyncOutcome::UpToDate { watermark });
            }
        }

        let missing = files.missing();
        for category in &missing {
            warn!(source = %category, "Export not found, its metrics stay empty");
        }

        let mut data = self.read_sources(&files)?;
        // Fails before anything is written under the strict note policy
        let set_records = ExertionExtractor::new(self.config.note_policy)?
            .extract(&data.strength.sets)?;

        let mut stats = SyncStats {
            energy_samples: data.health.active_energy.len(),
            nutrition_files: data.nutrition.len(),
            strength_sets: data.strength.sets.len(),
            dropped_records: data.health.dropped + data.strength.dropped,
            ..SyncStats::default()
        };

        let steps = std::mem::take(&mut data.health.steps);
        let summaries = self.daily_summaries(steps, &data, &mut stats);
        stats.days_written = self.db.upsert_daily_summaries(&summaries)?;
        info!(days = stats.days_written, "Daily summaries written");

        let policy = ReconcilePolicy::from(&self.config);
        stats.workouts = self
            .db
            .load_workouts(&data.health.workouts, &set_records, &policy)?;
        info!(workouts = %stats.workouts, "Workouts loaded");

        let watermark = self.db.record_run(Utc::now())?;
        info!(at = %watermark.timestamp.to_rfc3339(), "Recorded pipeline run");

        Ok(SyncOutcome::Completed {
            stats,
            watermark,
            missing,
        })
    }

    /// Parse every export, degrading unreadable ones to empty
    fn read_sources(&self, files: &ExportFiles) -> Result<SourceData> {
        let mut data = SourceData::default();

        if files.apple_health.exists() {
            let path = &files.apple_health.path;
            data.health = sources::or_empty("apple health", path, apple_health::parse_export(path))?;
        }

        if files.strength.exists() {
            let path = &files.strength.path;
            data.strength = sources::or_empty("strength log", path, strength::parse_file(path))?;
        }

        for file in &files.nutrition {
            let Some(modified) = file.modified else {
                continue;
            };
            let rows = sources::or_empty("nutrition", &file.path, nutrition::parse_file(&file.path))?;
            data.nutrition.push(NutritionFile {
                path: file.path.clone(),
                modified,
                rows,
            });
        }

        Ok(data)
    }

    /// Reduce every source to daily rows and outer-join them by date
    ///
    /// Steps are deduplicated across devices; active energy is summed as
    /// exported.
    fn daily_summaries(
        &self,
        steps: Vec<ActivitySample>,
        data: &SourceData,
        stats: &mut SyncStats,
    ) -> Vec<DailySummary> {
        stats.step_samples = steps.len();
        let steps = deduplicate(steps, &self.config.wearable_sources);
        stats.step_samples_kept = steps.len();

        let step_rows = aggregate_daily(&steps, Metric::TotalSteps);
        let energy_rows = aggregate_daily(&data.health.active_energy, Metric::ActiveEnergy);
        let nutrition_rows: Vec<DailyMetricRow> = nutrition::unify(&data.nutrition)
            .iter()
            .flat_map(|row| row.metric_rows())
            .collect();
        let volume_rows = daily_strength_volume(&data.strength.sets);

        merge_daily(&[&step_rows, &energy_rows, &nutrition_rows, &volume_rows])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotePolicy;
    use crate::HealthError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const STRONG: &str = "\
Date,Workout Name,Exercise Name,Set Order,Weight,Reps,Notes,RPE
2024-06-01 07:30:00,Day A,Squat,1,100,5,Set 1 RPE = 7,
2024-06-01 07:30:00,Day A,Squat,2,100,5,other note,
";

    fn engine(root: &Path, config: PipelineConfig) -> SyncEngine {
        let config = PipelineConfig {
            exports_dir: root.to_path_buf(),
            ..config
        };
        SyncEngine::new(HealthDb::open_in_memory().unwrap(), config)
    }

    #[test]
    fn test_empty_exports_still_record_a_run() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(temp.path(), PipelineConfig::default());

        let outcome = engine.run(&SyncOptions::default()).unwrap();

        assert_eq!(outcome.missing_sources(), ExportCategory::ALL.as_slice());
        assert!(engine.db().latest_watermark().unwrap().is_some());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("strong.csv"), STRONG).unwrap();
        let mut engine = engine(temp.path(), PipelineConfig::default());

        let outcome = engine
            .run(&SyncOptions {
                dry_run: true,
                ..SyncOptions::default()
            })
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::DryRun {
                state: RunState::NoPriorRun
            }
        );
        assert!(engine.db().latest_watermark().unwrap().is_none());
        assert_eq!(engine.db().row_counts().unwrap().daily_summaries, 0);
    }

    #[test]
    fn test_strict_note_policy_leaves_store_untouched() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("strong.csv"), STRONG).unwrap();
        let config = PipelineConfig {
            note_policy: NotePolicy::Strict,
            ..PipelineConfig::default()
        };
        let mut engine = engine(temp.path(), config);

        let err = engine.run(&SyncOptions::default()).unwrap_err();

        assert!(matches!(err, HealthError::AmbiguousNotes { .. }));
        assert!(engine.db().latest_watermark().unwrap().is_none());
        assert_eq!(engine.db().row_counts().unwrap().daily_summaries, 0);
    }

    #[test]
    fn test_force_reprocesses_when_up_to_date() {
        let temp = TempDir::new().unwrap();
        let mut engine = engine(temp.path(), PipelineConfig::default());
        engine.run(&SyncOptions::default()).unwrap();

        let again = engine.run(&SyncOptions::default()).unwrap();
        assert!(matches!(again, SyncOutcome::UpToDate { .. }));

        let forced = engine
            .run(&SyncOptions {
                force: true,
                ..SyncOptions::default()
            })
            .unwrap();
        assert!(matches!(forced, SyncOutcome::Completed { .. }));
        assert_eq!(engine.db().run_history(10).unwrap().len(), 2);
    }

    #[test]
    fn test_strength_only_run_writes_volume() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("strong.csv"), STRONG).unwrap();
        let mut engine = engine(temp.path(), PipelineConfig::default());

        let outcome = engine.run(&SyncOptions::default()).unwrap();

        let SyncOutcome::Completed { stats, missing, .. } = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(stats.days_written, 1);
        assert_eq!(stats.strength_sets, 2);
        // No Apple Health export, so no session to attach the sets to
        assert_eq!(stats.workouts.sets_orphaned, 2);
        assert!(missing.contains(&ExportCategory::AppleHealth));

        let summaries = engine.db().recent_summaries(10).unwrap();
        assert_eq!(summaries[0].strength_volume, 1000.0);
        assert_eq!(summaries[0].total_steps, 0);
    }
}
