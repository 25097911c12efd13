use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ScholarlyError};
use crate::models::{default_sort, AwardCriteriaRecord};

use super::plan::{Criterion, Literal, QueryPlan};

pub const OPERATOR_IN: &str = "$in";
pub const OPERATOR_GTE: &str = "$gte";

/// Translate an award's criteria into a query plan.
///
/// Predicates are emitted in the criteria's insertion order, and operators
/// within a field in their own order. An operator outside `$in` / `$gte`
/// fails the whole translation instead of being skipped. Field names are not
/// checked here; the executor binds them against the student schema.
pub fn translate(record: &AwardCriteriaRecord) -> Result<QueryPlan> {
    let predicates = predicates(&record.criteria)?;

    let sort = if record.sort.is_empty() {
        default_sort()
    } else {
        record.sort.clone()
    };

    debug!(
        award = %record.name,
        predicates = predicates.len(),
        limit = record.limit,
        "translated award criteria"
    );

    Ok(QueryPlan {
        predicates,
        sort,
        limit: record.limit,
    })
}

/// Turn a criteria mapping into AND-ed criteria. Award validation runs the
/// same pass so malformed criteria are never persisted.
pub(crate) fn predicates(criteria: &Map<String, Value>) -> Result<Vec<Criterion>> {
    let mut predicates = Vec::with_capacity(criteria.len());

    for (field, condition) in criteria {
        match condition {
            Value::Object(operators) if operators.is_empty() => {
                return Err(ScholarlyError::invalid_criteria(
                    field.as_str(),
                    "operator object must not be empty",
                ));
            }
            Value::Object(operators) => {
                for (operator, operand) in operators {
                    predicates.push(operator_criterion(field, operator, operand)?);
                }
            }
            literal => predicates.push(Criterion::Equals {
                field: field.clone(),
                value: Literal::from_json(field, literal)?,
            }),
        }
    }

    Ok(predicates)
}

fn operator_criterion(field: &str, operator: &str, operand: &Value) -> Result<Criterion> {
    match operator {
        OPERATOR_IN => {
            let items = operand.as_array().ok_or_else(|| {
                ScholarlyError::invalid_criteria(field, format!("{OPERATOR_IN} expects a list"))
            })?;
            let values = items
                .iter()
                .map(|item| Literal::from_json(field, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Criterion::In {
                field: field.to_string(),
                values,
            })
        }
        OPERATOR_GTE => Ok(Criterion::GreaterOrEqual {
            field: field.to_string(),
            value: Literal::from_json(field, operand)?,
        }),
        other => Err(ScholarlyError::UnsupportedOperator {
            field: field.to_string(),
            operator: other.to_string(),
        }),
    }
}
