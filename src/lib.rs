//! Core library for Scholarly, a scholarship recipient selector.
//!
//! Student data is imported from CSV into a local SQLite file, awards are
//! stored as named criteria, and [`Scholarly::select_recipients`] turns an
//! award into an ordered list of students for letters and email. Front-ends
//! (the bundled CLI or anything else) only deal with the types re-exported
//! here.
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod selection;
pub mod student_csv;

pub use config::StoreConfig;
pub use db::{AwardCriteriaStore, StudentBackend, StudentStore};
pub use error::{Result, ScholarlyError};
pub use models::{AwardCriteriaRecord, SortDirection, SortKey, StudentField, StudentRecord};
pub use query::{translate, Criterion, Literal, QueryPlan};
pub use selection::{select_for_award, Scholarly};
