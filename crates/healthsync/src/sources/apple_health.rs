//! Streaming parser for the Apple Health `export.xml`
//!
//! The export routinely runs to gigabytes, so it is read event by event and
//! only allow-listed `Record` types and `Workout` elements are materialized.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::db::models::WorkoutSession;
use crate::error::{HealthError, Result};
use crate::models::ActivitySample;

use super::fields::{parse_f64, parse_local_datetime};

pub const STEP_COUNT: &str = "HKQuantityTypeIdentifierStepCount";
pub const ACTIVE_ENERGY: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";
const WORKOUT_TYPE_PREFIX: &str = "HKWorkoutActivityType";

/// Everything the pipeline needs from one Apple Health export
#[derive(Debug, Default)]
pub struct AppleHealthExport {
    /// Step-count samples, still overlapping across devices
    pub steps: Vec<ActivitySample>,
    pub active_energy: Vec<ActivitySample>,
    pub workouts: Vec<WorkoutSession>,
    /// Allow-listed elements dropped because a required field did not parse
    pub dropped: usize,
}

/// Parse an export file from disk
pub fn parse_export(path: &Path) -> Result<AppleHealthExport> {
    let file = File::open(path).map_err(|e| HealthError::source_read(path, e))?;
    let export = parse_reader(BufReader::new(file))?;

    debug!(
        path = %path.display(),
        steps = export.steps.len(),
        active_energy = export.active_energy.len(),
        workouts = export.workouts.len(),
        dropped = export.dropped,
        "Parsed Apple Health export"
    );
    Ok(export)
}

/// Parse an export from any buffered reader
pub fn parse_reader<R: BufRead>(reader: R) -> Result<AppleHealthExport> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut export = AppleHealthExport::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"Record" => handle_record(&e, &mut export),
                b"Workout" => match parse_workout(&e) {
                    Some(workout) => export.workouts.push(workout),
                    None => export.dropped += 1,
                },
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(export)
}

fn handle_record(e: &BytesStart, export: &mut AppleHealthExport) {
    let record_type = attr(e, b"type");
    let target = match record_type.as_deref() {
        Some(STEP_COUNT) => &mut export.steps,
        Some(ACTIVE_ENERGY) => &mut export.active_energy,
        _ => return,
    };

    match parse_sample(e) {
        Some(sample) => target.push(sample),
        None => export.dropped += 1,
    }
}

fn parse_sample(e: &BytesStart) -> Option<ActivitySample> {
    let start = attr(e, b"startDate").as_deref().and_then(parse_local_datetime)?;
    let end = attr(e, b"endDate").as_deref().and_then(parse_local_datetime)?;
    if start > end {
        return None;
    }

    Some(ActivitySample {
        start,
        end,
        // A non-numeric value stays absent so the aggregator can skip it
        value: attr(e, b"value").as_deref().and_then(parse_f64),
        source: attr(e, b"sourceName").unwrap_or_default(),
    })
}

fn parse_workout(e: &BytesStart) -> Option<WorkoutSession> {
    let start = attr(e, b"startDate").as_deref().and_then(parse_local_datetime)?;
    let end = attr(e, b"endDate").as_deref().and_then(parse_local_datetime)?;
    let raw_type = attr(e, b"workoutActivityType")?;
    let duration_mins = attr(e, b"duration").as_deref().and_then(parse_f64)?;

    Some(WorkoutSession {
        workout_id: None,
        start,
        end,
        workout_type: raw_type
            .strip_prefix(WORKOUT_TYPE_PREFIX)
            .unwrap_or(&raw_type)
            .to_string(),
        duration_mins,
        total_distance: attr(e, b"totalDistance")
            .as_deref()
            .and_then(parse_f64)
            .unwrap_or(0.0),
        total_energy_burned: attr(e, b"totalEnergyBurned")
            .as_deref()
            .and_then(parse_f64)
            .unwrap_or(0.0),
    })
}

/// Unescaped attribute value; malformed attributes read as missing
fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    let attribute = e.try_get_attribute(name).ok().flatten()?;
    attribute.unescape_value().ok().map(|v| v.into_owned())
}
