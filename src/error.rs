//! Error taxonomy for the record query engine. Every failure surfaces to the
//! immediate caller as a distinct variant so a front-end can decide how to
//! present it; nothing in the core logs and swallows an error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScholarlyError {
    /// A value could not be coerced to the declared type of its field.
    #[error("invalid value '{value}' for field '{field}': {reason}")]
    MalformedRecord {
        field: String,
        value: String,
        reason: String,
    },

    /// The CSV structure did not match the student schema. `row` is the
    /// 1-based line in the file (the header is line 1).
    #[error("malformed CSV at row {row}: {message}")]
    MalformedCsv { row: u64, message: String },

    #[error("unsupported operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("unknown student field '{0}'")]
    UnknownField(String),

    #[error("an award named '{0}' already exists")]
    DuplicateName(String),

    #[error("no award named '{0}'")]
    AwardNotFound(String),

    /// Criteria, limit, or sort could not be understood.
    #[error("invalid criteria for '{field}': {reason}")]
    InvalidCriteria { field: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl ScholarlyError {
    pub(crate) fn malformed_record(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_criteria(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScholarlyError>;
