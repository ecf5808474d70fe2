//! Row models for the health database
//!
//! These mirror the tables created by `storage::HealthDb` and are what
//! downstream readers get back from its query methods.

pub mod models;

pub use models::*;
