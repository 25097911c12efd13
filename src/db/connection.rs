use std::fs;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Result, ScholarlyError};

/// Open a fresh connection to the configured database file, creating its
/// parent directory if needed. Every store operation opens its own
/// connection and lets it close on drop; nothing is held across calls.
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let path = config.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ScholarlyError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    debug!(path = %path.display(), "opening database");
    Ok(Connection::open(path)?)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
