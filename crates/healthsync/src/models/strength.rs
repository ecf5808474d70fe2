//! Strength-log models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the Strong export after field coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthSet {
    /// Start timestamp of the logged workout; shared by all its sets
    pub performed_at: NaiveDateTime,
    pub exercise_name: String,
    /// `None` for warm-up/drop-set markers ("W", "D") and other non-numeric orders
    pub set_order: Option<i32>,
    pub weight: Option<f64>,
    pub reps: Option<f64>,
    /// Structured RPE column; zero means "not entered"
    pub explicit_effort: Option<f64>,
    pub note: Option<String>,
}

impl StrengthSet {
    /// Training volume of this set, if both weight and reps are known
    pub fn volume(&self) -> Option<f64> {
        Some(self.weight? * self.reps?)
    }
}

/// A set with its exertion resolved, ready for the workout reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    /// Start timestamp of the logged workout this set belongs to
    pub session: NaiveDateTime,
    pub exercise_name: String,
    pub set_order: i32,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub exertion: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn set(weight: Option<f64>, reps: Option<f64>) -> StrengthSet {
        StrengthSet {
            performed_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap(),
            exercise_name: "Squat".to_string(),
            set_order: Some(1),
            weight,
            reps,
            explicit_effort: None,
            note: None,
        }
    }

    #[test]
    fn test_volume_requires_weight_and_reps() {
        assert_eq!(set(Some(100.0), Some(5.0)).volume(), Some(500.0));
        assert_eq!(set(None, Some(5.0)).volume(), None);
        assert_eq!(set(Some(100.0), None).volume(), None);
    }
}
