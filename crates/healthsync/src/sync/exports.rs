//! Export file discovery under the exports root

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{HealthError, Result};

const APPLE_HEALTH_EXPORT: &str = "apple_health_export/export.xml";
const STRONG_EXPORT: &str = "strong.csv";
const NUTRITION_PREFIX: &str = "MacroFactor-";
const NUTRITION_EXTENSIONS: [&str; 2] = ["xlsx", "csv"];

/// The three kinds of export the pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportCategory {
    AppleHealth,
    Strength,
    Nutrition,
}

impl ExportCategory {
    pub const ALL: [ExportCategory; 3] = [
        ExportCategory::AppleHealth,
        ExportCategory::Strength,
        ExportCategory::Nutrition,
    ];
}

impl fmt::Display for ExportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportCategory::AppleHealth => "apple health",
            ExportCategory::Strength => "strength log",
            ExportCategory::Nutrition => "nutrition",
        };
        f.write_str(label)
    }
}

/// A located export file and its modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub category: ExportCategory,
    pub path: PathBuf,
    /// `None` when the file does not exist or its metadata is unreadable
    pub modified: Option<SystemTime>,
}

impl ExportFile {
    fn probe(category: ExportCategory, path: PathBuf) -> Self {
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self {
            category,
            path,
            modified,
        }
    }

    pub fn exists(&self) -> bool {
        self.modified.is_some()
    }
}

/// Every export file the pipeline looks at for one run
#[derive(Debug, Clone)]
pub struct ExportFiles {
    pub apple_health: ExportFile,
    pub strength: ExportFile,
    /// Nutrition files present in the root, sorted by path
    pub nutrition: Vec<ExportFile>,
}

impl ExportFiles {
    /// Locate the exports under `root`
    ///
    /// A missing root is not an error; every category is then reported missing.
    pub fn discover(root: &Path) -> Result<Self> {
        let apple_health = ExportFile::probe(ExportCategory::AppleHealth, root.join(APPLE_HEALTH_EXPORT));
        let strength = ExportFile::probe(ExportCategory::Strength, root.join(STRONG_EXPORT));

        let mut nutrition = Vec::new();
        match fs::read_dir(root) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry?;
                    let name = entry.file_name();
                    if is_nutrition_export(&name.to_string_lossy()) {
                        nutrition.push(ExportFile::probe(ExportCategory::Nutrition, entry.path()));
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(root = %root.display(), "Exports directory does not exist");
            }
            Err(e) => return Err(HealthError::source_read(root, e)),
        }
        nutrition.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(
            root = %root.display(),
            apple_health = apple_health.exists(),
            strength = strength.exists(),
            nutrition = nutrition.len(),
            "Discovered export files"
        );

        Ok(Self {
            apple_health,
            strength,
            nutrition,
        })
    }

    /// All located files, in category order
    pub fn iter(&self) -> impl Iterator<Item = &ExportFile> {
        [&self.apple_health, &self.strength]
            .into_iter()
            .chain(self.nutrition.iter())
    }

    /// Newest modification time seen for a category
    pub fn newest(&self, category: ExportCategory) -> Option<SystemTime> {
        self.iter()
            .filter(|f| f.category == category)
            .filter_map(|f| f.modified)
            .max()
    }

    /// Categories with no readable file
    pub fn missing(&self) -> Vec<ExportCategory> {
        ExportCategory::ALL
            .into_iter()
            .filter(|c| self.newest(*c).is_none())
            .collect()
    }
}

/// `MacroFactor-*.xlsx` or `MacroFactor-*.csv`
pub fn is_nutrition_export(file_name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(NUTRITION_PREFIX) else {
        return false;
    };
    Path::new(rest)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| NUTRITION_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nutrition_file_names() {
        assert!(is_nutrition_export("MacroFactor-20240601.xlsx"));
        assert!(is_nutrition_export("MacroFactor-export.CSV"));
        assert!(!is_nutrition_export("MacroFactor-20240601.numbers"));
        assert!(!is_nutrition_export("macrofactor-20240601.csv"));
        assert!(!is_nutrition_export("strong.csv"));
    }

    #[test]
    fn test_discover_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("apple_health_export")).unwrap();
        fs::write(root.join("apple_health_export/export.xml"), "<HealthData/>").unwrap();
        fs::write(root.join("MacroFactor-b.csv"), "Date\n").unwrap();
        fs::write(root.join("MacroFactor-a.xlsx"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let files = ExportFiles::discover(root).unwrap();

        assert!(files.apple_health.exists());
        assert!(!files.strength.exists());
        assert_eq!(files.nutrition.len(), 2);
        assert!(files.nutrition[0].path.ends_with("MacroFactor-a.xlsx"));
        assert_eq!(files.missing(), vec![ExportCategory::Strength]);
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let files = ExportFiles::discover(&temp.path().join("absent")).unwrap();

        assert_eq!(files.missing(), ExportCategory::ALL.to_vec());
        assert_eq!(files.iter().count(), 2);
    }
}
