use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Result, ScholarlyError};
use crate::models::{StudentField, StudentRecord};
use crate::query::QueryPlan;
use crate::student_csv;

use super::connection::{open, table_exists};
use super::executor::{column_list, compile};

/// The storage operations recipient selection needs from a student table.
/// Any engine able to filter, sort, and truncate can stand behind it.
pub trait StudentBackend {
    /// Create the table if it does not exist yet.
    fn create_table(&self) -> Result<()>;
    /// Remove the table. Dropping an absent table is not an error.
    fn drop_table(&self) -> Result<()>;
    /// Add one student, creating the table first if needed.
    fn insert(&self, record: &StudentRecord) -> Result<()>;
    /// Run a plan: AND-ed predicates, then sort, then limit.
    fn query(&self, plan: &QueryPlan) -> Result<Vec<StudentRecord>>;
}

/// SQLite-backed student table. The table's lifetime follows the caller's
/// "open file" / "close file" actions; every method opens and closes its own
/// connection so results always reflect what is on disk.
#[derive(Debug, Clone)]
pub struct StudentStore {
    config: StoreConfig,
}

impl StudentStore {
    /// Build a store over the database file and table named in `config`.
    /// Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table(&self) -> &str {
        self.config.students_table()
    }

    /// Replace the whole table with the students in the CSV at `path`.
    ///
    /// The file is parsed before the database is touched, and drop, create,
    /// and inserts share one transaction: on failure the previous contents
    /// stay in place and the error is returned.
    pub fn replace_from_csv(&self, path: &Path) -> Result<usize> {
        let students = student_csv::read_students(path)?;

        let mut conn = open(&self.config)?;
        let tx = conn.transaction()?;
        tx.execute(&drop_sql(self.table()), [])?;
        tx.execute(&create_sql(self.table()), [])?;
        {
            let mut stmt = tx.prepare(&insert_sql(self.table()))?;
            for student in &students {
                insert_with(&mut stmt, student)?;
            }
        }
        tx.commit()?;

        info!(
            path = %path.display(),
            table = self.table(),
            rows = students.len(),
            "loaded students from CSV"
        );
        Ok(students.len())
    }

    /// Every student, highest GPA first, ties in insertion order.
    pub fn select_all(&self) -> Result<Vec<StudentRecord>> {
        self.query(&QueryPlan::all())
    }

    /// Run a translated award plan against the table.
    pub fn select_by_plan(&self, plan: &QueryPlan) -> Result<Vec<StudentRecord>> {
        self.query(plan)
    }

    /// Whether the student table currently exists, i.e. a file is open.
    pub fn is_loaded(&self) -> Result<bool> {
        let conn = open(&self.config)?;
        table_exists(&conn, self.table())
    }

    /// Number of students currently stored; `0` when no file is open.
    pub fn count(&self) -> Result<usize> {
        let conn = open(&self.config)?;
        if !table_exists(&conn, self.table())? {
            return Ok(0);
        }
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table()),
            [],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| ScholarlyError::from(rusqlite::Error::IntegralValueOutOfRange(0, count)))
    }

    /// Write the current table, in `select_all` order, to a CSV file.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let students = self.select_all()?;
        student_csv::write_students(path, &students)?;
        Ok(students.len())
    }
}

impl StudentBackend for StudentStore {
    fn create_table(&self) -> Result<()> {
        let conn = open(&self.config)?;
        conn.execute(&create_sql(self.table()), [])?;
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        let conn = open(&self.config)?;
        conn.execute(&drop_sql(self.table()), [])?;
        info!(table = self.table(), "dropped student table");
        Ok(())
    }

    fn insert(&self, record: &StudentRecord) -> Result<()> {
        self.create_table()?;
        let conn = open(&self.config)?;
        let mut stmt = conn.prepare(&insert_sql(self.table()))?;
        insert_with(&mut stmt, record)
    }

    fn query(&self, plan: &QueryPlan) -> Result<Vec<StudentRecord>> {
        // Binding happens first so a bad plan fails even with no file open.
        let compiled = compile(self.table(), plan)?;

        let conn = open(&self.config)?;
        if !table_exists(&conn, self.table())? {
            debug!(table = self.table(), "no student table, returning no rows");
            return Ok(Vec::new());
        }

        debug!(sql = %compiled.sql, params = ?compiled.params, "querying students");
        fetch_students(&conn, &compiled.sql, compiled.params)
    }
}

fn fetch_students(
    conn: &Connection,
    sql: &str,
    params: Vec<rusqlite::types::Value>,
) -> Result<Vec<StudentRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let students = stmt
        .query_map(params_from_iter(params), student_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(students)
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord::from_tuple((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    )))
}

fn insert_with(stmt: &mut rusqlite::Statement<'_>, record: &StudentRecord) -> Result<()> {
    let (name, student_id, gpa, major, classification, credits, enrolled, email, gender, in_state) =
        record.to_tuple();
    stmt.execute(params![
        name,
        student_id,
        gpa,
        major,
        classification,
        credits,
        enrolled,
        email,
        gender,
        in_state
    ])
    .map_err(|err| match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ScholarlyError::malformed_record(
            StudentField::StudentId.column(),
            record.student_id.as_str(),
            "a student with this id already exists",
        ),
        _ => err.into(),
    })?;
    Ok(())
}

fn create_sql(table: &str) -> String {
    let columns = StudentField::ALL
        .iter()
        .map(|field| format!("{} {}", field.column(), field.sql_declaration()))
        .collect::<Vec<_>>()
        .join(",\n            ");
    format!("CREATE TABLE IF NOT EXISTS \"{table}\" (\n            {columns}\n        )")
}

fn drop_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS \"{table}\"")
}

fn insert_sql(table: &str) -> String {
    let placeholders = (1..=StudentField::ALL.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({placeholders})",
        column_list()
    )
}
