//! Database models matching schema tables

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Metric;

/// Unified daily record, one per calendar date
///
/// Fields are zero when no source reported that metric for the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_steps: i64,
    pub active_energy_kcal: f64,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub strength_volume: f64,
}

impl DailySummary {
    /// Empty summary for a date, every metric zero
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_steps: 0,
            active_energy_kcal: 0.0,
            calories_kcal: 0.0,
            protein_g: 0.0,
            fat_g: 0.0,
            carbs_g: 0.0,
            strength_volume: 0.0,
        }
    }

    /// Add a value to the column for `metric`
    pub fn add(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::TotalSteps => self.total_steps += value as i64,
            Metric::ActiveEnergy => self.active_energy_kcal += value,
            Metric::Calories => self.calories_kcal += value,
            Metric::Protein => self.protein_g += value,
            Metric::Fat => self.fat_g += value,
            Metric::Carbs => self.carbs_g += value,
            Metric::StrengthVolume => self.strength_volume += value,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TotalSteps => self.total_steps as f64,
            Metric::ActiveEnergy => self.active_energy_kcal,
            Metric::Calories => self.calories_kcal,
            Metric::Protein => self.protein_g,
            Metric::Fat => self.fat_g,
            Metric::Carbs => self.carbs_g,
            Metric::StrengthVolume => self.strength_volume,
        }
    }
}

/// Workout session from the activity export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub workout_id: Option<i64>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Activity type without the `HKWorkoutActivityType` prefix
    pub workout_type: String,
    pub duration_mins: f64,
    pub total_distance: f64,
    pub total_energy_burned: f64,
}

/// Per-set detail row attached to a workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDetail {
    pub detail_id: Option<i64>,
    pub workout_id: i64,
    pub exercise_name: String,
    pub set_order: i32,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub rpe: Option<f64>,
}

/// Timestamp of a fully successful pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWatermark {
    pub run_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl RunWatermark {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            run_id: None,
            timestamp,
        }
    }

    /// Watermark used when no run was ever recorded
    pub fn epoch() -> Self {
        Self::new(DateTime::from_timestamp(0, 0).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_add_and_get() {
        let mut summary = DailySummary::empty(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        summary.add(Metric::TotalSteps, 8000.0);
        summary.add(Metric::TotalSteps, 500.0);
        summary.add(Metric::Protein, 140.5);

        assert_eq!(summary.total_steps, 8500);
        assert_eq!(summary.get(Metric::Protein), 140.5);
        assert_eq!(summary.get(Metric::Fat), 0.0);
    }

    #[test]
    fn test_epoch_watermark() {
        assert_eq!(RunWatermark::epoch().timestamp.timestamp(), 0);
    }
}
