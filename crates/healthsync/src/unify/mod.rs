//! Unification of parsed sources into daily summaries and set records

pub mod aggregate;
pub mod dedup;
pub mod exertion;
pub mod merge;

pub use aggregate::{aggregate_daily, daily_strength_volume};
pub use dedup::deduplicate;
pub use exertion::{ExertionExtractor, NoteTable};
pub use merge::merge_daily;
