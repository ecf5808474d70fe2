//! Nutrition export parser (MacroFactor `.csv` / `.xlsx`)
//!
//! The export's header row carries unit suffixes that change between app
//! versions, so columns are read by position: date, calories, protein, fat,
//! carbs. The header row is always skipped.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{HealthError, Result};
use crate::models::NutritionRow;

use super::fields::{parse_calendar_date, parse_f64};

/// Parsed rows of one nutrition file plus the metadata used for tie-breaks
#[derive(Debug, Clone)]
pub struct NutritionFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub rows: Vec<NutritionRow>,
}

/// Parse a nutrition export, dispatching on the file extension
pub fn parse_file(path: &Path) -> Result<Vec<NutritionRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let rows = match extension.as_deref() {
        Some("xlsx") | Some("xls") | Some("xlsm") => parse_workbook(path)?,
        Some("csv") => {
            let file = std::fs::File::open(path).map_err(|e| HealthError::source_read(path, e))?;
            parse_csv_reader(file)?
        }
        _ => {
            return Err(HealthError::source_read(
                path,
                "unsupported nutrition export extension",
            ))
        }
    };

    debug!(path = %path.display(), rows = rows.len(), "Parsed nutrition export");
    Ok(rows)
}

/// Parse CSV rows by column position
pub fn parse_csv_reader<R: Read>(reader: R) -> Result<Vec<NutritionRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => continue,
        };

        let Some(date) = record.get(0).and_then(parse_calendar_date) else {
            continue;
        };
        let cell = |i: usize| record.get(i).and_then(parse_f64);

        rows.push(NutritionRow {
            date,
            calories: cell(1),
            protein: cell(2),
            fat: cell(3),
            carbs: cell(4),
        });
    }

    Ok(rows)
}

/// Parse the first worksheet of a workbook by column position
fn parse_workbook(path: &Path) -> Result<Vec<NutritionRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HealthError::source_read(path, "workbook has no worksheets"))??;

    let mut rows = Vec::new();
    for row in range.rows().skip(1) {
        let Some(date) = row.first().and_then(cell_date) else {
            continue;
        };
        let cell = |i: usize| row.get(i).and_then(cell_number);

        rows.push(NutritionRow {
            date,
            calories: cell(1),
            protein: cell(2),
            fat: cell(3),
            carbs: cell(4),
        });
    }

    Ok(rows)
}

fn cell_date(cell: &Data) -> Option<chrono::NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_calendar_date(s),
        _ => None,
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_f64(s),
        _ => None,
    }
}

/// Union rows from several files, resolving overlapping dates by recency
///
/// Files are applied oldest-modified first (path breaks ties), so a date
/// present in several files takes the row from the most recently modified
/// one. Within a file the last row for a date wins. Output is ordered by date.
pub fn unify(files: &[NutritionFile]) -> Vec<NutritionRow> {
    let mut ordered: Vec<&NutritionFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let mut by_date: BTreeMap<chrono::NaiveDate, NutritionRow> = BTreeMap::new();
    for file in ordered {
        for row in &file.rows {
            if let Some(previous) = by_date.insert(row.date, row.clone()) {
                if previous != *row {
                    debug!(
                        date = %row.date,
                        file = %file.path.display(),
                        "Nutrition row replaced by a more recent export"
                    );
                }
            }
        }
    }

    by_date.into_values().collect()
}
