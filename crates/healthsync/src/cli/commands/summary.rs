//! Daily summary commands for healthsync

use crate::cli::{open_existing_db, print_csv, print_json, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::Result;

/// Show the most recent daily summaries
pub fn show(config: PipelineConfig, days: u32, format: OutputFormat) -> Result<()> {
    let Some((_, db)) = open_existing_db(&config)? else {
        return Ok(());
    };

    let summaries = db.recent_summaries(days)?;

    match format {
        OutputFormat::Json => return print_json(&summaries),
        OutputFormat::Csv => return print_csv(&summaries),
        OutputFormat::Table => {}
    }

    if summaries.is_empty() {
        println!("No daily summaries found.");
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:>10} {:>9} {:>9} {:>7} {:>7} {:>10}",
        "Date", "Steps", "Active", "Calories", "Protein", "Fat", "Carbs", "Volume"
    );
    println!("{}", "-".repeat(80));

    for s in &summaries {
        println!(
            "{:<12} {:>8} {:>10.0} {:>9.0} {:>9.1} {:>7.1} {:>7.1} {:>10.0}",
            s.date.format("%Y-%m-%d"),
            s.total_steps,
            s.active_energy_kcal,
            s.calories_kcal,
            s.protein_g,
            s.fat_g,
            s.carbs_g,
            s.strength_volume
        );
    }

    println!("\nShowing {} days", summaries.len());
    Ok(())
}
