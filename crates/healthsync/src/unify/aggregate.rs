//! Daily reduction of deduplicated samples and strength sets

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ActivitySample, DailyMetricRow, Metric, StrengthSet};

/// Sum sample values per calendar day of their end timestamp
///
/// A sample spanning midnight is credited entirely to the day it ends on.
/// Absent values are skipped, each day's total is truncated to a whole number
/// and days that end up at zero or below are left out. Output is date-ordered.
pub fn aggregate_daily(samples: &[ActivitySample], metric: Metric) -> Vec<DailyMetricRow> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for sample in samples {
        if let Some(value) = sample.value {
            *totals.entry(sample.end.date()).or_insert(0.0) += value;
        }
    }

    totals
        .into_iter()
        .map(|(date, total)| (date, total.trunc()))
        .filter(|(_, total)| *total > 0.0)
        .map(|(date, total)| DailyMetricRow::new(date, metric, total))
        .collect()
}

/// Sum of weight x reps per workout day, warm-up sets included
///
/// Reduced like [`aggregate_daily`]: truncated, and non-positive days dropped.
pub fn daily_strength_volume(sets: &[StrengthSet]) -> Vec<DailyMetricRow> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for set in sets {
        if let Some(volume) = set.volume() {
            *totals.entry(set.performed_at.date()).or_insert(0.0) += volume;
        }
    }

    totals
        .into_iter()
        .map(|(date, volume)| (date, volume.trunc()))
        .filter(|(_, volume)| *volume > 0.0)
        .map(|(date, volume)| DailyMetricRow::new(date, Metric::StrengthVolume, volume))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample(start: NaiveDateTime, end: NaiveDateTime, value: Option<f64>) -> ActivitySample {
        ActivitySample {
            start,
            end,
            value,
            source: "Apple Watch".to_string(),
        }
    }

    #[test]
    fn test_sample_across_midnight_counts_on_end_day() {
        let samples = vec![sample(at(1, 23, 58), at(2, 0, 3), Some(120.0))];

        let rows = aggregate_daily(&samples, Metric::TotalSteps);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(rows[0].value, 120.0);
    }

    #[test]
    fn test_totals_are_truncated_and_non_positive_days_dropped() {
        let samples = vec![
            sample(at(1, 10, 0), at(1, 10, 1), Some(0.6)),
            sample(at(1, 10, 1), at(1, 10, 2), Some(0.6)),
            sample(at(2, 10, 0), at(2, 10, 1), Some(0.4)),
            sample(at(3, 10, 0), at(3, 10, 1), None),
        ];

        let rows = aggregate_daily(&samples, Metric::ActiveEnergy);

        assert_eq!(rows, vec![DailyMetricRow::new(at(1, 0, 0).date(), Metric::ActiveEnergy, 1.0)]);
    }

    #[test]
    fn test_rows_are_date_ordered() {
        let samples = vec![
            sample(at(3, 9, 0), at(3, 9, 5), Some(30.0)),
            sample(at(1, 9, 0), at(1, 9, 5), Some(10.0)),
            sample(at(2, 9, 0), at(2, 9, 5), Some(20.0)),
        ];

        let rows = aggregate_daily(&samples, Metric::TotalSteps);
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();

        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_strength_volume_includes_warmups() {
        let set = |order: Option<i32>, weight: f64, reps: f64| StrengthSet {
            performed_at: at(1, 7, 30),
            exercise_name: "Squat".to_string(),
            set_order: order,
            weight: Some(weight),
            reps: Some(reps),
            explicit_effort: None,
            note: None,
        };
        let sets = vec![set(None, 60.0, 5.0), set(Some(1), 100.0, 5.0), set(Some(2), 0.0, 10.0)];

        let rows = daily_strength_volume(&sets);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric, Metric::StrengthVolume);
        assert_eq!(rows[0].value, 800.0);
    }

    #[test]
    fn test_strength_volume_is_truncated() {
        let set = |weight: f64, reps: f64| StrengthSet {
            performed_at: at(1, 7, 30),
            exercise_name: "Bench Press".to_string(),
            set_order: Some(1),
            weight: Some(weight),
            reps: Some(reps),
            explicit_effort: None,
            note: None,
        };

        let rows = daily_strength_volume(&[set(100.5, 5.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 502.0);

        assert!(daily_strength_volume(&[set(0.1, 5.0)]).is_empty());
    }
}
