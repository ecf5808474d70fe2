//! Normalized shapes produced by the source parsers
//!
//! Nothing in here is persisted directly; see `db::models` for stored rows.

pub mod activity;
pub mod daily;
pub mod strength;

pub use activity::{ActivitySample, SourceTier};
pub use daily::{DailyMetricRow, Metric, NutritionRow};
pub use strength::{SetRecord, StrengthSet};
