//! Strong app CSV export parser
//!
//! Only the columns the pipeline uses are read; any other column (duration,
//! distance, workout notes) is ignored. Every field arrives as text and is
//! coerced here.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HealthError, Result};
use crate::models::StrengthSet;

use super::fields::{non_empty, parse_local_datetime, parse_opt_f64, parse_whole};

#[derive(Debug, Deserialize)]
struct StrongRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Exercise Name", default)]
    exercise_name: Option<String>,
    #[serde(rename = "Set Order", default)]
    set_order: Option<String>,
    #[serde(rename = "Weight", default)]
    weight: Option<String>,
    #[serde(rename = "Reps", default)]
    reps: Option<String>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
    #[serde(rename = "RPE", default)]
    rpe: Option<String>,
}

/// Result of parsing a Strong export
#[derive(Debug, Default)]
pub struct StrengthLog {
    pub sets: Vec<StrengthSet>,
    /// Rows without a usable date or exercise name
    pub dropped: usize,
}

/// Parse a Strong export from disk
pub fn parse_file(path: &Path) -> Result<StrengthLog> {
    let file = std::fs::File::open(path).map_err(|e| HealthError::source_read(path, e))?;
    let log = parse_reader(file)?;
    debug!(
        path = %path.display(),
        sets = log.sets.len(),
        dropped = log.dropped,
        "Parsed strength log"
    );
    Ok(log)
}

pub fn parse_reader<R: Read>(reader: R) -> Result<StrengthLog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut log = StrengthLog::default();
    for result in csv_reader.deserialize::<StrongRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => {
                log.dropped += 1;
                continue;
            }
        };

        match coerce(row) {
            Some(set) => log.sets.push(set),
            None => log.dropped += 1,
        }
    }

    Ok(log)
}

fn coerce(row: StrongRow) -> Option<StrengthSet> {
    let performed_at = row.date.as_deref().and_then(parse_local_datetime)?;
    let exercise_name = non_empty(row.exercise_name.as_deref())?;

    Some(StrengthSet {
        performed_at,
        exercise_name,
        set_order: row
            .set_order
            .as_deref()
            .and_then(parse_whole)
            .and_then(|n| i32::try_from(n).ok()),
        weight: parse_opt_f64(row.weight.as_deref()),
        reps: parse_opt_f64(row.reps.as_deref()),
        explicit_effort: parse_opt_f64(row.rpe.as_deref()),
        note: non_empty(row.notes.as_deref()),
    })
}
