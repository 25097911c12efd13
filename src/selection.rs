//! Recipient selection: the path from an award name to an ordered list of
//! students, plus the open/close file actions a front-end drives.

use std::path::Path;

use tracing::info;

use crate::config::StoreConfig;
use crate::db::{AwardCriteriaStore, StudentBackend, StudentStore};
use crate::error::{Result, ScholarlyError};
use crate::models::{AwardCriteriaRecord, StudentRecord};
use crate::query::translate;

/// Both stores over one database file.
#[derive(Debug, Clone)]
pub struct Scholarly {
    students: StudentStore,
    awards: AwardCriteriaStore,
}

impl Scholarly {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            students: StudentStore::new(config.clone()),
            awards: AwardCriteriaStore::new(config),
        }
    }

    pub fn students(&self) -> &StudentStore {
        &self.students
    }

    pub fn awards(&self) -> &AwardCriteriaStore {
        &self.awards
    }

    /// Load a student CSV, replacing whatever was open, and return the new
    /// table in display order. Warning the user before discarding an open
    /// file is up to the caller.
    pub fn open_file(&self, csv_path: &Path) -> Result<Vec<StudentRecord>> {
        self.students.replace_from_csv(csv_path)?;
        self.students.select_all()
    }

    pub fn close_file(&self) -> Result<()> {
        self.students.drop_table()
    }

    /// Resolve `award_name` and return its recipients in award order.
    pub fn select_recipients(&self, award_name: &str) -> Result<Vec<StudentRecord>> {
        let award = self
            .awards
            .get_by_name(award_name)?
            .ok_or_else(|| ScholarlyError::AwardNotFound(award_name.to_string()))?;
        select_for_award(&self.students, &award)
    }
}

/// Run an award's criteria against any student backend.
pub fn select_for_award<B: StudentBackend + ?Sized>(
    backend: &B,
    award: &AwardCriteriaRecord,
) -> Result<Vec<StudentRecord>> {
    let plan = translate(award)?;
    let recipients = backend.query(&plan)?;
    info!(award = %award.name, recipients = recipients.len(), "selected recipients");
    Ok(recipients)
}
