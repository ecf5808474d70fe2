//! Activity sample models
//!
//! A sample is one device-reported measurement interval from the Apple Health
//! export (a burst of steps, a slice of active energy).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One interval-bounded measurement from a reporting device
///
/// Timestamps are naive local wall-clock times; the export's UTC offset is
/// dropped at parse time so every sample shares one calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySample {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Measured value; `None` when the export carried a non-numeric value
    pub value: Option<f64>,
    /// Reporting device, e.g. "Jane's Apple Watch"
    pub source: String,
}

impl ActivitySample {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, value: f64, source: impl Into<String>) -> Self {
        Self {
            start,
            end,
            value: Some(value),
            source: source.into(),
        }
    }

    /// Whether this interval shares any time with `other`
    ///
    /// Touching intervals (one ends exactly when the next starts) do not overlap.
    pub fn overlaps(&self, other: &ActivitySample) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Trust tier of a reporting source. Lower sorts first and wins overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceTier {
    /// Worn on the body (watch)
    Wearable = 1,
    /// Companion phone or anything else
    Other = 2,
}

impl SourceTier {
    /// Classify a source name against the configured wearable markers
    pub fn classify(source: &str, wearable_markers: &[String]) -> Self {
        if wearable_markers
            .iter()
            .any(|marker| source.contains(marker.as_str()))
        {
            SourceTier::Wearable
        } else {
            SourceTier::Other
        }
    }
}
