//! Engine-agnostic query plans. [`translate`] turns an award's declarative
//! criteria into a [`QueryPlan`]; storage backends bind and run it.

mod plan;
mod translate;

pub use plan::{Criterion, Literal, QueryPlan};
pub(crate) use translate::predicates;
pub use translate::{translate, OPERATOR_GTE, OPERATOR_IN};
