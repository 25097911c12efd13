//! Binds a [`QueryPlan`] to the student table. Field names resolve against
//! the schema here, and literal operands are coerced to the column's storage
//! class so GPA and credits compare numerically. Text columns declared
//! `COLLATE NOCASE` make `=`, `IN`, `>=`, and `ORDER BY` ignore case on their
//! own because the column sits on the left of every comparison.

use rusqlite::types::Value as SqlValue;

use crate::error::{Result, ScholarlyError};
use crate::models::{FieldKind, SortDirection, StudentField};
use crate::query::{Criterion, Literal, QueryPlan};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

pub(crate) fn column_list() -> String {
    StudentField::ALL
        .iter()
        .map(|field| field.column())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn compile(table: &str, plan: &QueryPlan) -> Result<CompiledQuery> {
    let mut clauses = Vec::with_capacity(plan.predicates.len());
    let mut params = Vec::new();

    for criterion in &plan.predicates {
        let field = StudentField::resolve(criterion.field())?;
        let column = field.column();
        match criterion {
            Criterion::Equals { value, .. } => {
                params.push(bind(field, value)?);
                clauses.push(format!("{column} = ?"));
            }
            Criterion::GreaterOrEqual { value, .. } => {
                params.push(bind(field, value)?);
                clauses.push(format!("{column} >= ?"));
            }
            Criterion::In { values, .. } => {
                for value in values {
                    params.push(bind(field, value)?);
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                clauses.push(format!("{column} IN ({placeholders})"));
            }
        }
    }

    let mut order = Vec::with_capacity(plan.sort.len() + 1);
    for key in &plan.sort {
        let field = StudentField::resolve(&key.field)?;
        let direction = match key.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        order.push(format!("{} {direction}", field.column()));
    }
    // insertion order breaks ties
    order.push("rowid ASC".to_string());

    let mut sql = format!("SELECT {} FROM \"{table}\"", column_list());
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&order.join(", "));
    if plan.limit > 0 {
        sql.push_str(" LIMIT ?");
        params.push(SqlValue::Integer(i64::from(plan.limit)));
    }

    Ok(CompiledQuery { sql, params })
}

fn bind(field: StudentField, literal: &Literal) -> Result<SqlValue> {
    let value = match (field.kind(), literal) {
        (FieldKind::Text, Literal::Text(text)) => SqlValue::Text(text.clone()),
        (FieldKind::Text, Literal::Integer(int)) => SqlValue::Text(int.to_string()),
        (FieldKind::Text, Literal::Real { text, .. }) => SqlValue::Text(text.clone()),
        (_, Literal::Integer(int)) => SqlValue::Integer(*int),
        (_, Literal::Real { value, .. }) => SqlValue::Real(*value),
        (_, Literal::Text(text)) => parse_numeric(field, text)?,
    };
    Ok(value)
}

fn parse_numeric(field: StudentField, text: &str) -> Result<SqlValue> {
    let trimmed = text.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(SqlValue::Integer(int));
    }
    match trimmed.parse::<f64>() {
        Ok(real) if real.is_finite() => Ok(SqlValue::Real(real)),
        _ => Err(ScholarlyError::invalid_criteria(
            field.column(),
            format!("'{text}' is not a number"),
        )),
    }
}
