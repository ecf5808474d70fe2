//! Per-day metric rows feeding the daily merger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One column of the daily summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalSteps,
    ActiveEnergy,
    Calories,
    Protein,
    Fat,
    Carbs,
    StrengthVolume,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::TotalSteps,
        Metric::ActiveEnergy,
        Metric::Calories,
        Metric::Protein,
        Metric::Fat,
        Metric::Carbs,
        Metric::StrengthVolume,
    ];

    /// Column name in `daily_summaries`
    pub fn column(&self) -> &'static str {
        match self {
            Metric::TotalSteps => "total_steps",
            Metric::ActiveEnergy => "active_energy_kcal",
            Metric::Calories => "calories_kcal",
            Metric::Protein => "protein_g",
            Metric::Fat => "fat_g",
            Metric::Carbs => "carbs_g",
            Metric::StrengthVolume => "strength_volume",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Reduced value of one metric on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRow {
    pub date: NaiveDate,
    pub metric: Metric,
    pub value: f64,
}

impl DailyMetricRow {
    pub fn new(date: NaiveDate, metric: Metric, value: f64) -> Self {
        Self { date, metric, value }
    }
}

/// One day of a nutrition export; unparseable cells are `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRow {
    pub date: NaiveDate,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
}

impl NutritionRow {
    /// Sparse metric rows for this day; absent and zero cells are left out
    pub fn metric_rows(&self) -> Vec<DailyMetricRow> {
        [
            (Metric::Calories, self.calories),
            (Metric::Protein, self.protein),
            (Metric::Fat, self.fat),
            (Metric::Carbs, self.carbs),
        ]
        .into_iter()
        .filter_map(|(metric, value)| match value {
            Some(v) if v > 0.0 => Some(DailyMetricRow::new(self.date, metric, v)),
            _ => None,
        })
        .collect()
    }
}
