//! SQLite store for unified health data
//!
//! This module owns the four output tables:
//! - daily_summaries: one row per calendar date, upserted
//! - workouts / workout_details: sessions and their per-set rows
//! - pipeline_runs: append-only log of successful runs (the watermark)

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{DailySummary, RunWatermark, WorkoutDetail, WorkoutSession};
use crate::error::{HealthError, Result};
use crate::models::SetRecord;

use super::reconcile::{self, ReconcilePolicy, ReconcileStats};
use super::{DATE_FORMAT, TIMESTAMP_FORMAT};

/// Row counts of the output tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub daily_summaries: i64,
    pub workouts: i64,
    pub workout_details: i64,
}

/// Persistence gateway for the pipeline
///
/// Each write operation runs in its own transaction; a failure rolls back
/// everything that operation wrote.
pub struct HealthDb {
    conn: Connection,
}

impl HealthDb {
    /// Open or create the health database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| HealthError::database("Failed to open health database", e))?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HealthError::database("Failed to open in-memory database", e))?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Run migrations
    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS daily_summaries (
                    date TEXT PRIMARY KEY,
                    total_steps INTEGER NOT NULL DEFAULT 0,
                    active_energy_kcal REAL NOT NULL DEFAULT 0,
                    calories_kcal REAL NOT NULL DEFAULT 0,
                    protein_g REAL NOT NULL DEFAULT 0,
                    fat_g REAL NOT NULL DEFAULT 0,
                    carbs_g REAL NOT NULL DEFAULT 0,
                    strength_volume REAL NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS workouts (
                    workout_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    workout_type TEXT NOT NULL,
                    duration_mins REAL,
                    total_distance REAL,
                    total_energy_burned REAL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_start_type
                ON workouts(start_date, workout_type);

                CREATE TABLE IF NOT EXISTS workout_details (
                    detail_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workout_id INTEGER NOT NULL REFERENCES workouts(workout_id),
                    exercise_name TEXT NOT NULL,
                    set_order INTEGER NOT NULL,
                    weight REAL,
                    reps INTEGER,
                    rpe REAL,
                    UNIQUE (workout_id, exercise_name, set_order)
                );

                CREATE TABLE IF NOT EXISTS pipeline_runs (
                    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_timestamp TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| HealthError::database("Failed to run migrations", e))?;

        Ok(())
    }

    // =========================================================================
    // Daily Summaries
    // =========================================================================

    /// Insert or fully replace summaries keyed by date, in one transaction
    pub fn upsert_daily_summaries(&mut self, summaries: &[DailySummary]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| HealthError::database("Failed to begin transaction", e))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO daily_summaries (date, total_steps, active_energy_kcal,
                         calories_kcal, protein_g, fat_g, carbs_g, strength_volume)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT (date) DO UPDATE SET
                         total_steps = excluded.total_steps,
                         active_energy_kcal = excluded.active_energy_kcal,
                         calories_kcal = excluded.calories_kcal,
                         protein_g = excluded.protein_g,
                         fat_g = excluded.fat_g,
                         carbs_g = excluded.carbs_g,
                         strength_volume = excluded.strength_volume",
                )
                .map_err(|e| HealthError::database("Failed to prepare summary upsert", e))?;

            for s in summaries {
                stmt.execute(params![
                    s.date.format(DATE_FORMAT).to_string(),
                    s.total_steps,
                    s.active_energy_kcal,
                    s.calories_kcal,
                    s.protein_g,
                    s.fat_g,
                    s.carbs_g,
                    s.strength_volume,
                ])
                .map_err(|e| HealthError::database("Failed to upsert daily summary", e))?;
            }
        }

        tx.commit()
            .map_err(|e| HealthError::database("Failed to commit daily summaries", e))?;

        Ok(summaries.len())
    }

    /// The most recent `limit` summaries, oldest first
    pub fn recent_summaries(&self, limit: u32) -> Result<Vec<DailySummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT date, total_steps, active_energy_kcal, calories_kcal,
                        protein_g, fat_g, carbs_g, strength_volume
                 FROM daily_summaries
                 ORDER BY date DESC
                 LIMIT ?",
            )
            .map_err(|e| HealthError::database("Failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(DailySummary {
                    date: date_column(row, 0)?,
                    total_steps: row.get(1)?,
                    active_energy_kcal: row.get(2)?,
                    calories_kcal: row.get(3)?,
                    protein_g: row.get(4)?,
                    fat_g: row.get(5)?,
                    carbs_g: row.get(6)?,
                    strength_volume: row.get(7)?,
                })
            })
            .map_err(|e| HealthError::database("Failed to query summaries", e))?;

        let mut summaries = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HealthError::database("Failed to read summary", e))?;
        summaries.reverse();
        Ok(summaries)
    }

    // =========================================================================
    // Workouts
    // =========================================================================

    /// Load sessions and their sets in one transaction
    pub fn load_workouts(
        &mut self,
        sessions: &[WorkoutSession],
        sets: &[SetRecord],
        policy: &ReconcilePolicy,
    ) -> Result<ReconcileStats> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| HealthError::database("Failed to begin transaction", e))?;

        let stats = reconcile::reconcile(&tx, sessions, sets, policy)?;

        tx.commit()
            .map_err(|e| HealthError::database("Failed to commit workouts", e))?;

        Ok(stats)
    }

    /// Sessions whose start falls on a date in `from..=to`, earliest first
    pub fn workouts_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<WorkoutSession>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT workout_id, start_date, end_date, workout_type, duration_mins,
                        total_distance, total_energy_burned
                 FROM workouts
                 WHERE date(start_date) BETWEEN ? AND ?
                 ORDER BY start_date, workout_id",
            )
            .map_err(|e| HealthError::database("Failed to prepare query", e))?;

        let rows = stmt
            .query_map(
                params![
                    from.format(DATE_FORMAT).to_string(),
                    to.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok(WorkoutSession {
                        workout_id: Some(row.get(0)?),
                        start: timestamp_column(row, 1)?,
                        end: timestamp_column(row, 2)?,
                        workout_type: row.get(3)?,
                        duration_mins: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                        total_distance: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                        total_energy_burned: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                    })
                },
            )
            .map_err(|e| HealthError::database("Failed to query workouts", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HealthError::database("Failed to read workout", e))
    }

    /// Detail rows of one session, by exercise then set order
    pub fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<WorkoutDetail>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT detail_id, workout_id, exercise_name, set_order, weight, reps, rpe
                 FROM workout_details
                 WHERE workout_id = ?
                 ORDER BY exercise_name, set_order",
            )
            .map_err(|e| HealthError::database("Failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![workout_id], |row| {
                Ok(WorkoutDetail {
                    detail_id: Some(row.get(0)?),
                    workout_id: row.get(1)?,
                    exercise_name: row.get(2)?,
                    set_order: row.get(3)?,
                    weight: row.get(4)?,
                    reps: row.get(5)?,
                    rpe: row.get(6)?,
                })
            })
            .map_err(|e| HealthError::database("Failed to query workout details", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HealthError::database("Failed to read workout detail", e))
    }

    // =========================================================================
    // Pipeline Runs
    // =========================================================================

    /// Latest recorded watermark, if any run has completed
    pub fn latest_watermark(&self) -> Result<Option<RunWatermark>> {
        self.conn
            .query_row(
                "SELECT run_id, run_timestamp FROM pipeline_runs ORDER BY run_id DESC LIMIT 1",
                [],
                watermark_row,
            )
            .optional()
            .map_err(|e| HealthError::database("Failed to read watermark", e))
    }

    /// Append a watermark for a completed run
    pub fn record_run(&self, at: DateTime<Utc>) -> Result<RunWatermark> {
        self.conn
            .execute(
                "INSERT INTO pipeline_runs (run_timestamp) VALUES (?)",
                params![at.to_rfc3339()],
            )
            .map_err(|e| HealthError::database("Failed to record pipeline run", e))?;

        Ok(RunWatermark {
            run_id: Some(self.conn.last_insert_rowid()),
            timestamp: at,
        })
    }

    /// The most recent `limit` runs, newest first
    pub fn run_history(&self, limit: u32) -> Result<Vec<RunWatermark>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT run_id, run_timestamp FROM pipeline_runs ORDER BY run_id DESC LIMIT ?",
            )
            .map_err(|e| HealthError::database("Failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![limit], watermark_row)
            .map_err(|e| HealthError::database("Failed to query pipeline runs", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HealthError::database("Failed to read pipeline run", e))
    }

    /// Count rows in each output table
    pub fn row_counts(&self) -> Result<RowCounts> {
        self.conn
            .query_row(
                "SELECT
                     (SELECT COUNT(*) FROM daily_summaries),
                     (SELECT COUNT(*) FROM workouts),
                     (SELECT COUNT(*) FROM workout_details)",
                [],
                |row| {
                    Ok(RowCounts {
                        daily_summaries: row.get(0)?,
                        workouts: row.get(1)?,
                        workout_details: row.get(2)?,
                    })
                },
            )
            .map_err(|e| HealthError::database("Failed to count rows", e))
    }
}

fn watermark_row(row: &Row<'_>) -> rusqlite::Result<RunWatermark> {
    let raw: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(RunWatermark {
        run_id: Some(row.get(0)?),
        timestamp,
    })
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
