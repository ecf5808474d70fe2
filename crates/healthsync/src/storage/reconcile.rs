//! Workout reconciliation
//!
//! Sessions are matched on (start, type). Sets carry only the workout start
//! from the strength log, which rarely lines up to the second with the
//! watch-recorded session, so they attach to the session of the strength type
//! on the same calendar day that spans, or else starts nearest to, that start.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::db::models::WorkoutSession;
use crate::error::{HealthError, Result};
use crate::models::SetRecord;

use super::health_db::timestamp_column;
use super::{DATE_FORMAT, TIMESTAMP_FORMAT};

/// How existing rows are treated during a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Session type that strength sets attach to
    pub strength_workout_type: String,
    /// Rewrite end, duration, distance and energy of sessions already stored
    pub overwrite_existing_sessions: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            strength_workout_type: "TraditionalStrengthTraining".to_string(),
            overwrite_existing_sessions: false,
        }
    }
}

impl From<&PipelineConfig> for ReconcilePolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            strength_workout_type: config.strength_workout_type.clone(),
            overwrite_existing_sessions: config.overwrite_existing_sessions,
        }
    }
}

/// Outcome counts of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub sessions_inserted: u32,
    pub sessions_updated: u32,
    pub sessions_skipped: u32,
    pub sets_inserted: u32,
    pub sets_updated: u32,
    /// Sets with no session of the strength type on their workout's date
    pub sets_orphaned: u32,
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sessions: {} new, {} updated, {} unchanged; sets: {} new, {} updated, {} orphaned",
            self.sessions_inserted,
            self.sessions_updated,
            self.sessions_skipped,
            self.sets_inserted,
            self.sets_updated,
            self.sets_orphaned
        )
    }
}

/// Load sessions, then attach sets to their parents
///
/// Runs on whatever connection it is given; the caller owns the transaction.
pub fn reconcile(
    conn: &Connection,
    sessions: &[WorkoutSession],
    sets: &[SetRecord],
    policy: &ReconcilePolicy,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();

    for session in sessions {
        upsert_session(conn, session, policy, &mut stats)?;
    }

    let mut parents: HashMap<NaiveDateTime, Option<i64>> = HashMap::new();
    for set in sets {
        let parent = match parents.get(&set.session) {
            Some(parent) => *parent,
            None => {
                let found = find_parent(conn, set.session, &policy.strength_workout_type)?;
                if found.is_none() {
                    warn!(session = %set.session, workout_type = %policy.strength_workout_type, "No parent session for strength sets");
                }
                parents.insert(set.session, found);
                found
            }
        };

        match parent {
            Some(workout_id) => upsert_set(conn, workout_id, set, &mut stats)?,
            None => stats.sets_orphaned += 1,
        }
    }

    debug!(%stats, "Reconciled workouts");
    Ok(stats)
}

fn upsert_session(
    conn: &Connection,
    session: &WorkoutSession,
    policy: &ReconcilePolicy,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let start = session.start.format(TIMESTAMP_FORMAT).to_string();
    let end = session.end.format(TIMESTAMP_FORMAT).to_string();

    let existing: Option<i64> = conn
        .query_row(
            "SELECT workout_id FROM workouts WHERE start_date = ? AND workout_type = ?",
            params![start, session.workout_type],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| HealthError::database("Failed to look up workout", e))?;

    match existing {
        None => {
            conn.execute(
                "INSERT INTO workouts (start_date, end_date, workout_type, duration_mins,
                     total_distance, total_energy_burned)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    start,
                    end,
                    session.workout_type,
                    session.duration_mins,
                    session.total_distance,
                    session.total_energy_burned,
                ],
            )
            .map_err(|e| HealthError::database("Failed to insert workout", e))?;
            stats.sessions_inserted += 1;
        }
        Some(workout_id) if policy.overwrite_existing_sessions => {
            conn.execute(
                "UPDATE workouts SET end_date = ?, duration_mins = ?, total_distance = ?,
                     total_energy_burned = ?
                 WHERE workout_id = ?",
                params![
                    end,
                    session.duration_mins,
                    session.total_distance,
                    session.total_energy_burned,
                    workout_id,
                ],
            )
            .map_err(|e| HealthError::database("Failed to update workout", e))?;
            stats.sessions_updated += 1;
        }
        Some(_) => stats.sessions_skipped += 1,
    }

    Ok(())
}

/// Session of `workout_type` on the same day as a logged workout start
///
/// A session whose span contains `logged_start` wins; otherwise the one
/// starting nearest to it, the earlier on a tie.
fn find_parent(
    conn: &Connection,
    logged_start: NaiveDateTime,
    workout_type: &str,
) -> Result<Option<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT workout_id, start_date, end_date FROM workouts
             WHERE date(start_date) = ? AND workout_type = ?
             ORDER BY start_date, workout_id",
        )
        .map_err(|e| HealthError::database("Failed to prepare parent lookup", e))?;

    let candidates = stmt
        .query_map(
            params![logged_start.date().format(DATE_FORMAT).to_string(), workout_type],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    timestamp_column(row, 1)?,
                    timestamp_column(row, 2)?,
                ))
            },
        )
        .map_err(|e| HealthError::database("Failed to find parent workout", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| HealthError::database("Failed to read parent workout", e))?;

    if let Some((workout_id, _, _)) = candidates
        .iter()
        .find(|(_, start, end)| *start <= logged_start && logged_start <= *end)
    {
        return Ok(Some(*workout_id));
    }

    // min_by_key keeps the first minimum, and candidates are start-ordered
    Ok(candidates
        .iter()
        .min_by_key(|(_, start, _)| (*start - logged_start).num_seconds().abs())
        .map(|(workout_id, _, _)| *workout_id))
}

fn upsert_set(
    conn: &Connection,
    workout_id: i64,
    set: &SetRecord,
    stats: &mut ReconcileStats,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE workout_details SET weight = ?, reps = ?, rpe = ?
             WHERE workout_id = ? AND exercise_name = ? AND set_order = ?",
            params![
                set.weight,
                set.reps,
                set.exertion,
                workout_id,
                set.exercise_name,
                set.set_order,
            ],
        )
        .map_err(|e| HealthError::database("Failed to update workout detail", e))?;

    if updated > 0 {
        stats.sets_updated += 1;
        return Ok(());
    }

    conn.execute(
        "INSERT INTO workout_details (workout_id, exercise_name, set_order, weight, reps, rpe)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            workout_id,
            set.exercise_name,
            set.set_order,
            set.weight,
            set.reps,
            set.exertion,
        ],
    )
    .map_err(|e| HealthError::database("Failed to insert workout detail", e))?;
    stats.sets_inserted += 1;

    Ok(())
}
