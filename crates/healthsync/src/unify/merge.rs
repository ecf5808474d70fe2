//! Outer join of per-source daily rows into one summary per date

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::db::models::DailySummary;
use crate::models::DailyMetricRow;

/// Merge any number of daily row streams into date-ordered summaries
///
/// Every date present in at least one stream gets a summary; metrics no
/// stream reported stay zero. Rows for the same date and metric are summed,
/// so the result does not depend on the order of the streams.
pub fn merge_daily(streams: &[&[DailyMetricRow]]) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for row in streams.iter().flat_map(|stream| stream.iter()) {
        if row.value <= 0.0 {
            continue;
        }
        by_date
            .entry(row.date)
            .or_insert_with(|| DailySummary::empty(row.date))
            .add(row.metric, row.value);
    }

    by_date.into_values().collect()
}
