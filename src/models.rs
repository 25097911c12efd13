//! Domain records that mirror the SQLite schema and get passed to every
//! consumer of the engine (tabular display, letter generation, email). They
//! stay plain data holders; persistence and querying live elsewhere.

mod award;
mod student;

pub use award::{default_sort, AwardCriteriaRecord, AwardTuple, SortDirection, SortKey};
pub use student::{FieldKind, FieldValue, StudentField, StudentRecord, StudentTuple};
