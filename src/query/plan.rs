use std::fmt;

use serde_json::Value;

use crate::error::{Result, ScholarlyError};
use crate::models::SortKey;

/// A scalar operand taken from award criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Integer(i64),
    /// A decimal operand. `text` is the number exactly as written in the
    /// criteria so text columns compare against what the user typed.
    Real { value: f64, text: String },
}

impl Literal {
    /// Accept JSON strings and numbers; anything else cannot be compared
    /// against a student column.
    pub fn from_json(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Literal::Text(text.clone())),
            Value::Number(number) => Ok(match number.as_i64() {
                Some(int) => Literal::Integer(int),
                None => Literal::Real {
                    value: number.as_f64().ok_or_else(|| {
                        ScholarlyError::invalid_criteria(field, format!("{number} is out of range"))
                    })?,
                    text: number.to_string(),
                },
            }),
            other => Err(ScholarlyError::invalid_criteria(
                field,
                format!("expected a string or number, found {other}"),
            )),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(text) => write!(f, "{text:?}"),
            Literal::Integer(int) => write!(f, "{int}"),
            Literal::Real { text, .. } => f.write_str(text),
        }
    }
}

/// A single condition on one student field. Criteria in a plan are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Equals { field: String, value: Literal },
    In { field: String, values: Vec<Literal> },
    GreaterOrEqual { field: String, value: Literal },
}

impl Criterion {
    pub fn field(&self) -> &str {
        match self {
            Criterion::Equals { field, .. }
            | Criterion::In { field, .. }
            | Criterion::GreaterOrEqual { field, .. } => field,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Equals { field, value } => write!(f, "{field} == {value}"),
            Criterion::GreaterOrEqual { field, value } => write!(f, "{field} >= {value}"),
            Criterion::In { field, values } => {
                write!(f, "{field} IN (")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Predicates, ordering, and truncation for one recipient selection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: Vec<Criterion>,
    pub sort: Vec<SortKey>,
    /// `0` means no limit.
    pub limit: u32,
}

impl QueryPlan {
    /// Every student, highest GPA first.
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            sort: crate::models::default_sort(),
            limit: 0,
        }
    }
}
