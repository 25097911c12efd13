use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde_json::Value;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::{Result, ScholarlyError};
use crate::models::AwardCriteriaRecord;

use super::connection::open;

/// Named award criteria, keyed case-insensitively by name. The criteria and
/// sort order are stored as JSON text.
#[derive(Debug, Clone)]
pub struct AwardCriteriaStore {
    config: StoreConfig,
}

impl AwardCriteriaStore {
    /// Build a store over the award table named in `config`. The table is
    /// created on first use.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table(&self) -> &str {
        self.config.award_criteria_table()
    }

    /// Open a connection with the award table in place.
    fn connect(&self) -> Result<Connection> {
        let conn = open(&self.config)?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (
                    name TEXT PRIMARY KEY NOT NULL COLLATE NOCASE,
                    criteria TEXT NOT NULL,
                    \"limit\" INTEGER NOT NULL DEFAULT 0,
                    sort TEXT NOT NULL
                )",
                self.table()
            ),
            [],
        )?;
        Ok(conn)
    }

    /// Insert a new award after validating its name and criteria, so an
    /// unsupported operator is rejected here rather than at selection time.
    /// A name that collides with an existing one, in any
    /// case, fails with [`ScholarlyError::DuplicateName`].
    pub fn insert(&self, record: AwardCriteriaRecord) -> Result<AwardCriteriaRecord> {
        let record = record.validate()?;
        let conn = self.connect()?;
        insert_with(&conn, self.table(), &record)?;
        Ok(record)
    }

    /// Replace the award currently named `original_name`, which may also be
    /// renamed in the process.
    pub fn update(
        &self,
        original_name: &str,
        record: AwardCriteriaRecord,
    ) -> Result<AwardCriteriaRecord> {
        let record = record.validate()?;
        let (name, criteria, limit, sort) = record.to_tuple()?;
        let conn = self.connect()?;
        let updated = conn
            .execute(
                &format!(
                    "UPDATE \"{}\" SET name = ?1, criteria = ?2, \"limit\" = ?3, sort = ?4
                     WHERE name = ?5",
                    self.table()
                ),
                params![name, criteria, limit, sort, original_name],
            )
            .map_err(|err| map_unique_constraint(err, &record.name))?;

        if updated == 0 {
            Err(ScholarlyError::AwardNotFound(original_name.to_string()))
        } else {
            Ok(record)
        }
    }

    /// Look up an award by name, ignoring case.
    pub fn get_by_name(&self, name: &str) -> Result<Option<AwardCriteriaRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT name, criteria, \"limit\", sort FROM \"{}\" WHERE name = ?1",
                    self.table()
                ),
                params![name],
                award_row,
            )
            .optional()?;
        row.map(AwardCriteriaRecord::from_tuple).transpose()
    }

    /// Every award, ordered by name.
    pub fn get_all(&self) -> Result<Vec<AwardCriteriaRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT name, criteria, \"limit\", sort FROM \"{}\" ORDER BY name ASC",
            self.table()
        ))?;
        let rows = stmt
            .query_map([], award_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(AwardCriteriaRecord::from_tuple).collect()
    }

    /// Remove an award. Returns whether a row was deleted; deleting an
    /// unknown name is not an error.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            &format!("DELETE FROM \"{}\" WHERE name = ?1", self.table()),
            params![name],
        )?;
        Ok(deleted > 0)
    }

    /// Seed awards from raw definitions. Every entry is validated before
    /// anything is written, and all inserts share one transaction.
    pub fn bulk_load(&self, definitions: Vec<Value>) -> Result<usize> {
        let records = definitions
            .into_iter()
            .map(AwardCriteriaRecord::from_definition)
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for record in &records {
            insert_with(&tx, self.table(), record)?;
        }
        tx.commit()?;

        info!(table = self.table(), awards = records.len(), "loaded award definitions");
        Ok(records.len())
    }

    /// Read a JSON array of award definitions from `path` and load it.
    pub fn load_definitions_file(&self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path).map_err(|source| ScholarlyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definitions: Vec<Value> = serde_json::from_str(&text)?;
        self.bulk_load(definitions)
    }
}

fn insert_with(conn: &Connection, table: &str, record: &AwardCriteriaRecord) -> Result<()> {
    let (name, criteria, limit, sort) = record.to_tuple()?;
    conn.execute(
        &format!("INSERT INTO \"{table}\" (name, criteria, \"limit\", sort) VALUES (?1, ?2, ?3, ?4)"),
        params![name, criteria, limit, sort],
    )
    .map_err(|err| map_unique_constraint(err, &record.name))?;
    Ok(())
}

fn award_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// The only constraint on the award table is the primary key.
fn map_unique_constraint(err: rusqlite::Error, name: &str) -> ScholarlyError {
    if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
        ScholarlyError::DuplicateName(name.to_string())
    } else {
        err.into()
    }
}
