//! Sync commands for healthsync

use serde::Serialize;

use crate::cli::{open_db, open_existing_db, print_csv, print_json, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::sync::{SyncEngine, SyncOptions, SyncOutcome};

/// Run the pipeline
pub fn run(
    mut config: PipelineConfig,
    force: bool,
    dry_run: bool,
    overwrite_sessions: bool,
) -> Result<()> {
    if overwrite_sessions {
        config.overwrite_existing_sessions = true;
    }

    let db_path = config.database_path()?;
    println!("Using database: {}", db_path.display());
    println!("Reading exports from: {}", config.exports_dir.display());

    if dry_run {
        println!("Dry run mode - no changes will be made");
    }

    let db = open_db(&config)?;
    let mut engine = SyncEngine::new(db, config);
    let outcome = engine.run(&SyncOptions { force, dry_run })?;

    match outcome {
        SyncOutcome::UpToDate { watermark } => {
            println!(
                "Up to date: no export changed since {}",
                watermark.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Use --force to process anyway.");
        }
        SyncOutcome::DryRun { state } => {
            println!("Decision: {}", state);
            if !state.needs_run() && !force {
                println!("A real run would do nothing.");
            }
        }
        SyncOutcome::Completed {
            stats,
            watermark,
            missing,
        } => {
            println!("\nSync complete: {}", stats);
            for category in &missing {
                println!("Warning: no {} export found; its columns were left at zero", category);
            }
            println!(
                "Watermark: {}",
                watermark.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct RunRow {
    run_id: Option<i64>,
    run_timestamp: String,
}

/// Show what is stored and whether a run is pending
pub fn status(config: PipelineConfig, format: OutputFormat) -> Result<()> {
    let Some((db_path, db)) = open_existing_db(&config)? else {
        return Ok(());
    };

    let history: Vec<RunRow> = db
        .run_history(10)?
        .into_iter()
        .map(|run| RunRow {
            run_id: run.run_id,
            run_timestamp: run.timestamp.to_rfc3339(),
        })
        .collect();

    match format {
        OutputFormat::Json => return print_json(&history),
        OutputFormat::Csv => return print_csv(&history),
        OutputFormat::Table => {}
    }

    let counts = db.row_counts()?;
    let engine = SyncEngine::new(db, config);
    let (state, files) = engine.plan()?;

    println!("Database: {}", db_path.display());
    println!("Exports:  {}", engine.config().exports_dir.display());
    println!();
    println!("Data stored:");
    println!("  Daily summaries: {:>8}", counts.daily_summaries);
    println!("  Workouts:        {:>8}", counts.workouts);
    println!("  Workout sets:    {:>8}", counts.workout_details);
    println!();
    println!("Export files:");
    for file in files.iter() {
        let modified = file
            .modified
            .map(|m| {
                chrono::DateTime::<chrono::Utc>::from(m)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            })
            .unwrap_or_else(|| "missing".to_string());
        println!("  {:<13} {:<24} {}", file.category.to_string(), modified, file.path.display());
    }
    println!();
    println!("Status: {}", state);

    if !history.is_empty() {
        println!();
        println!("{:<8} {}", "Run", "Completed at");
        println!("{}", "-".repeat(40));
        for run in &history {
            let id = run.run_id.map(|id| id.to_string()).unwrap_or_default();
            println!("{:<8} {}", id, run.run_timestamp);
        }
    }

    Ok(())
}
