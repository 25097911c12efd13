use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ScholarlyError};
use crate::query::predicates;

/// Direction of one sort key, written as `1` or `-1` in award definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl TryFrom<i64> for SortDirection {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(SortDirection::Ascending),
            -1 => Ok(SortDirection::Descending),
            other => Err(format!("sort direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<SortDirection> for i64 {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// One `[field, direction]` entry of an award's sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, SortDirection)", into = "(String, SortDirection)")]
pub struct SortKey {
    /// Student field to order by. Resolved against the schema when the plan
    /// runs.
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl From<(String, SortDirection)> for SortKey {
    fn from((field, direction): (String, SortDirection)) -> Self {
        Self { field, direction }
    }
}

impl From<SortKey> for (String, SortDirection) {
    fn from(key: SortKey) -> Self {
        (key.field, key.direction)
    }
}

/// Highest cumulative GPA first.
pub fn default_sort() -> Vec<SortKey> {
    vec![SortKey::new("cumulative_gpa", SortDirection::Descending)]
}

/// Positional form of an award row: name, criteria JSON, limit, sort JSON.
pub type AwardTuple = (String, String, i64, String);

/// A named, reusable filter that selects scholarship recipients.
///
/// `criteria` keeps the declarative shape users type in: each key is a
/// student field mapped either to a literal (equality) or to an object of
/// `$in` / `$gte` operators. Insertion order is preserved so translation is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwardCriteriaRecord {
    /// Unique award name, compared without regard to case.
    pub name: String,
    /// Field conditions, AND-ed together. Empty selects every student.
    #[serde(default)]
    pub criteria: Map<String, Value>,
    /// Maximum number of recipients; `0` means no limit.
    #[serde(default)]
    pub limit: u32,
    /// Ordering of the recipients; ties fall back to insertion order.
    #[serde(default = "default_sort")]
    pub sort: Vec<SortKey>,
}

impl Default for AwardCriteriaRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            criteria: Map::new(),
            limit: 0,
            sort: default_sort(),
        }
    }
}

impl AwardCriteriaRecord {
    /// An award with no limit and the default GPA ordering.
    pub fn new(name: impl Into<String>, criteria: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            criteria,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Parse one entry of a definitions file (or any raw mapping) and
    /// validate it.
    pub fn from_definition(value: Value) -> Result<Self> {
        let label = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        let record: Self = serde_json::from_value(value)
            .map_err(|err| ScholarlyError::invalid_criteria(label, err.to_string()))?;
        record.validate()
    }

    /// Check the invariants required before persistence: a non-empty name,
    /// and criteria that use only `$in` (with a list) and `$gte` over string
    /// or number operands. An empty sort falls back to the default order.
    pub fn validate(mut self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(ScholarlyError::invalid_criteria(
                "name",
                "award name must not be empty",
            ));
        }
        predicates(&self.criteria)?;
        if self.sort.is_empty() {
            self.sort = default_sort();
        }
        Ok(self)
    }

    /// Positional form used for row insertion, with criteria and sort
    /// serialized as JSON.
    pub fn to_tuple(&self) -> Result<AwardTuple> {
        Ok((
            self.name.clone(),
            serde_json::to_string(&self.criteria)?,
            i64::from(self.limit),
            serde_json::to_string(&self.sort)?,
        ))
    }

    pub fn from_tuple((name, criteria, limit, sort): AwardTuple) -> Result<Self> {
        let limit = u32::try_from(limit).map_err(|_| {
            ScholarlyError::invalid_criteria(name.as_str(), format!("invalid limit {limit}"))
        })?;
        Ok(Self {
            criteria: serde_json::from_str(&criteria)?,
            sort: serde_json::from_str(&sort)?,
            name,
            limit,
        })
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("criteria".into(), Value::Object(self.criteria.clone()));
        map.insert("limit".into(), Value::from(self.limit));
        map.insert(
            "sort".into(),
            Value::Array(
                self.sort
                    .iter()
                    .map(|key| {
                        Value::Array(vec![
                            Value::String(key.field.clone()),
                            Value::from(i64::from(key.direction)),
                        ])
                    })
                    .collect(),
            ),
        );
        map
    }
}

impl fmt::Display for AwardCriteriaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_map()))
    }
}
