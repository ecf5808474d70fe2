pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sources;
pub mod storage;
pub mod sync;
pub mod unify;

pub use error::{HealthError, Result};
