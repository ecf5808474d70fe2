//! Format adapters for the three export sources
//!
//! Each parser turns one raw export into normalized rows. Unparseable fields
//! become absent values and unusable records are dropped and counted; only a
//! file that cannot be read at all produces an error, which the caller may
//! degrade to an empty result with [`or_empty`].

pub mod apple_health;
pub mod fields;
pub mod nutrition;
pub mod strength;

use std::path::Path;

use tracing::warn;

use crate::error::Result;

pub use apple_health::AppleHealthExport;
pub use nutrition::NutritionFile;
pub use strength::StrengthLog;

/// Degrade a source read failure to an empty result
///
/// Persistence and configuration errors are passed through unchanged.
pub fn or_empty<T: Default>(label: &str, path: &Path, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_recoverable_source_error() => {
            warn!(source = label, path = %path.display(), error = %e, "Source unreadable, continuing without it");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;

    #[test]
    fn test_or_empty_swallows_source_errors() {
        let path = Path::new("strong.csv");
        let result: Result<Vec<u8>> = Err(HealthError::source_read(path, "gone"));
        assert!(or_empty("strong", path, result).unwrap().is_empty());
    }

    #[test]
    fn test_or_empty_keeps_database_errors() {
        let path = Path::new("strong.csv");
        let result: Result<Vec<u8>> = Err(HealthError::Database("locked".to_string()));
        assert!(or_empty("strong", path, result).is_err());
    }
}
