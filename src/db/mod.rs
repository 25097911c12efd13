//! Persistence split across the two tables the engine owns.

mod awards;
mod connection;
mod executor;
mod students;

pub use awards::AwardCriteriaStore;
pub use connection::open;
pub use students::{StudentBackend, StudentStore};
