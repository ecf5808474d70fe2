//! Storage layer for unified health data
//!
//! ## Architecture
//!
//! - **SQLite** (`health.db`): daily summaries, workouts with per-set details,
//!   and the pipeline run log used as the incremental watermark
//! - **Reconciler**: attaches strength-log sets to watch-recorded sessions
//!
//! Dates are stored as `YYYY-MM-DD` text and session timestamps as local wall
//! time `YYYY-MM-DD HH:MM:SS`, so lexical order is chronological and SQLite's
//! `date()` works on them directly. Run timestamps are RFC 3339 in UTC.

mod health_db;
pub mod reconcile;

pub use health_db::{HealthDb, RowCounts};
pub use reconcile::{ReconcilePolicy, ReconcileStats};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
