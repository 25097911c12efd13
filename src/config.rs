//! Store configuration. Table names and the database location travel in an
//! immutable struct handed to each store, so tests can point independent
//! stores at their own files and schemas.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{Result, ScholarlyError};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".scholarly";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "scholarly.sqlite";

pub const DEFAULT_STUDENTS_TABLE: &str = "students";
pub const DEFAULT_AWARD_CRITERIA_TABLE: &str = "award_criteria";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    database_path: PathBuf,
    students_table: String,
    award_criteria_table: String,
}

impl StoreConfig {
    /// Configuration for a database file at `path` with the default table
    /// names.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            students_table: DEFAULT_STUDENTS_TABLE.to_string(),
            award_criteria_table: DEFAULT_AWARD_CRITERIA_TABLE.to_string(),
        }
    }

    /// Resolve `~/.scholarly/scholarly.sqlite`.
    pub fn default_location() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| ScholarlyError::InvalidConfig("could not locate home directory".into()))?;
        Ok(Self::new(
            base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME),
        ))
    }

    /// Override the table names. Both are interpolated into SQL, so they must
    /// be plain identifiers.
    pub fn with_table_names(
        mut self,
        students_table: impl Into<String>,
        award_criteria_table: impl Into<String>,
    ) -> Result<Self> {
        let students_table = students_table.into();
        let award_criteria_table = award_criteria_table.into();
        validate_identifier(&students_table)?;
        validate_identifier(&award_criteria_table)?;
        if students_table.eq_ignore_ascii_case(&award_criteria_table) {
            return Err(ScholarlyError::InvalidConfig(format!(
                "student and award tables must differ, both are '{students_table}'"
            )));
        }
        self.students_table = students_table;
        self.award_criteria_table = award_criteria_table;
        Ok(self)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn students_table(&self) -> &str {
        &self.students_table
    }

    pub fn award_criteria_table(&self) -> &str {
        &self.award_criteria_table
    }
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid && !name.to_ascii_lowercase().starts_with("sqlite_") {
        Ok(())
    } else {
        Err(ScholarlyError::InvalidConfig(format!(
            "'{name}' is not a usable table name"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_table_names() {
        let config = StoreConfig::new("db.sqlite");
        assert_eq!(config.students_table(), "students");
        assert_eq!(config.award_criteria_table(), "award_criteria");
        assert_eq!(config.database_path(), Path::new("db.sqlite"));
    }

    #[test]
    fn custom_table_names_are_validated() {
        let config = StoreConfig::new("db.sqlite")
            .with_table_names("spring_students", "spring_awards")
            .unwrap();
        assert_eq!(config.students_table(), "spring_students");

        for bad in ["", "1students", "students; DROP TABLE x", "sqlite_master"] {
            let err = StoreConfig::new("db.sqlite")
                .with_table_names(bad, "awards")
                .unwrap_err();
            assert!(matches!(err, ScholarlyError::InvalidConfig(_)), "{bad}");
        }
    }

    #[test]
    fn table_names_must_differ() {
        let err = StoreConfig::new("db.sqlite")
            .with_table_names("records", "RECORDS")
            .unwrap_err();
        assert!(matches!(err, ScholarlyError::InvalidConfig(_)));
    }
}
