//! Workout commands for healthsync

use chrono::{Duration, Local};
use serde::Serialize;

use crate::cli::{open_existing_db, parse_date, print_csv, print_json, OutputFormat};
use crate::config::PipelineConfig;
use crate::db::models::{WorkoutDetail, WorkoutSession};
use crate::error::Result;

#[derive(Debug, Serialize)]
struct WorkoutWithSets {
    #[serde(flatten)]
    session: WorkoutSession,
    sets: Vec<WorkoutDetail>,
}

/// List workouts in a date range, optionally with their sets
pub fn list(
    config: PipelineConfig,
    from: Option<String>,
    to: Option<String>,
    with_sets: bool,
    format: OutputFormat,
) -> Result<()> {
    let Some((_, db)) = open_existing_db(&config)? else {
        return Ok(());
    };

    let today = Local::now().date_naive();
    let to = match to {
        Some(s) => parse_date(&s)?,
        None => today,
    };
    let from = match from {
        Some(s) => parse_date(&s)?,
        None => to - Duration::days(30),
    };

    let sessions = db.workouts_between(from, to)?;

    match format {
        OutputFormat::Csv if with_sets => {
            let mut details = Vec::new();
            for session in &sessions {
                if let Some(id) = session.workout_id {
                    details.extend(db.sets_for_workout(id)?);
                }
            }
            return print_csv(&details);
        }
        OutputFormat::Csv => return print_csv(&sessions),
        OutputFormat::Json => {
            let mut workouts = Vec::with_capacity(sessions.len());
            for session in sessions {
                let sets = match (with_sets, session.workout_id) {
                    (true, Some(id)) => db.sets_for_workout(id)?,
                    _ => Vec::new(),
                };
                workouts.push(WorkoutWithSets { session, sets });
            }
            return print_json(&workouts);
        }
        OutputFormat::Table => {}
    }

    if sessions.is_empty() {
        println!("No workouts found from {} to {}.", from, to);
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<30} {:>8} {:>10} {:>8}",
        "ID", "Start", "Type", "Minutes", "Distance", "kcal"
    );
    println!("{}", "-".repeat(88));

    for session in &sessions {
        let id = session.workout_id.map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:<6} {:<20} {:<30} {:>8.1} {:>10.2} {:>8.0}",
            id,
            session.start.format("%Y-%m-%d %H:%M"),
            session.workout_type,
            session.duration_mins,
            session.total_distance,
            session.total_energy_burned
        );

        if !with_sets {
            continue;
        }
        let Some(workout_id) = session.workout_id else {
            continue;
        };
        for set in db.sets_for_workout(workout_id)? {
            let weight = set.weight.map(|w| format!("{:.1}", w)).unwrap_or("-".to_string());
            let reps = set.reps.map(|r| r.to_string()).unwrap_or("-".to_string());
            let rpe = set.rpe.map(|r| format!("{:.1}", r)).unwrap_or("-".to_string());
            println!(
                "       {:<28} set {:>2}  {:>7} x {:<4} RPE {}",
                set.exercise_name, set.set_order, weight, reps, rpe
            );
        }
    }

    println!("\nShowing {} workouts from {} to {}", sessions.len(), from, to);
    Ok(())
}
