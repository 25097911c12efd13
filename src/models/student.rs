use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, ScholarlyError};

/// One column of the student table. The order of [`StudentField::ALL`] is the
/// canonical column order for storage, CSV export, and tabular display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentField {
    Name,
    StudentId,
    CumGpa,
    Major,
    Classification,
    EarnedCredits,
    Enrolled,
    Email,
    Gender,
    InState,
}

/// How values of a field are stored and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Real,
    Integer,
}

impl StudentField {
    pub const ALL: [StudentField; 10] = [
        StudentField::Name,
        StudentField::StudentId,
        StudentField::CumGpa,
        StudentField::Major,
        StudentField::Classification,
        StudentField::EarnedCredits,
        StudentField::Enrolled,
        StudentField::Email,
        StudentField::Gender,
        StudentField::InState,
    ];

    /// Column name used in the database and in CSV headers.
    pub fn column(self) -> &'static str {
        match self {
            StudentField::Name => "name",
            StudentField::StudentId => "student_id",
            StudentField::CumGpa => "cum_gpa",
            StudentField::Major => "major",
            StudentField::Classification => "classification",
            StudentField::EarnedCredits => "earned_credits",
            StudentField::Enrolled => "enrolled",
            StudentField::Email => "email",
            StudentField::Gender => "gender",
            StudentField::InState => "in_state",
        }
    }

    /// Storage class of the column. GPA and credits compare numerically,
    /// everything else compares as text.
    pub fn kind(self) -> FieldKind {
        match self {
            StudentField::CumGpa => FieldKind::Real,
            StudentField::EarnedCredits => FieldKind::Integer,
            _ => FieldKind::Text,
        }
    }

    /// Fields declared `COLLATE NOCASE`. Equality, `$in`, `$gte`, and sorting
    /// on these ignore ASCII case.
    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            StudentField::Major
                | StudentField::Classification
                | StudentField::Enrolled
                | StudentField::Gender
                | StudentField::InState
        )
    }

    /// Resolve a field name from a criteria key, sort key, or CSV header.
    /// Matching ignores case and accepts the long-form aliases.
    pub fn resolve(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("cumulative_gpa") {
            return Ok(StudentField::CumGpa);
        }
        StudentField::ALL
            .into_iter()
            .find(|field| field.column().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ScholarlyError::UnknownField(name.to_string()))
    }

    pub(crate) fn sql_declaration(self) -> &'static str {
        match self {
            StudentField::Name => "TEXT NOT NULL",
            StudentField::StudentId => "TEXT PRIMARY KEY NOT NULL",
            StudentField::CumGpa => "REAL NOT NULL",
            StudentField::EarnedCredits => "INTEGER NOT NULL",
            StudentField::Email => "TEXT NOT NULL",
            _ => "TEXT NOT NULL COLLATE NOCASE",
        }
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for StudentField {
    type Err = ScholarlyError;

    fn from_str(s: &str) -> Result<Self> {
        StudentField::resolve(s)
    }
}

/// A single typed value pulled out of a [`StudentRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Real(f64),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Real(value) => write!(f, "{value}"),
            FieldValue::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Value::String(text),
            FieldValue::Real(real) => Value::from(real),
            FieldValue::Integer(int) => Value::from(int),
        }
    }
}

/// Positional form of a student row, in canonical column order.
pub type StudentTuple = (
    String,
    String,
    f64,
    String,
    String,
    i64,
    String,
    String,
    String,
    String,
);

/// One row of student data.
///
/// `name` is kept verbatim from the source CSV: letter generation splits it
/// into first and last names on its own terms.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StudentRecord {
    /// Full name as written in the CSV, usually `Last, First`.
    pub name: String,
    /// Institutional id and primary key of the student table. Never empty
    /// once persisted.
    pub student_id: String,
    /// Cumulative GPA, the default ranking key for every award.
    #[serde(rename = "cum_gpa")]
    pub cumulative_gpa: f64,
    /// Declared major. Compared without regard to case.
    pub major: String,
    /// Freshman through Senior (or whatever the registrar exports). Compared
    /// without regard to case.
    pub classification: String,
    /// Total credit hours earned so far.
    pub earned_credits: i64,
    /// `Yes` or `No`, any case.
    pub enrolled: String,
    /// Address letters are mailed to.
    pub email: String,
    /// Compared without regard to case.
    pub gender: String,
    /// `Yes` or `No`, any case.
    pub in_state: String,
}

impl StudentRecord {
    /// Canonical column headers.
    pub fn headers() -> [&'static str; 10] {
        StudentField::ALL.map(StudentField::column)
    }

    /// Pull a single field out as a typed value.
    pub fn value(&self, field: StudentField) -> FieldValue {
        match field {
            StudentField::Name => FieldValue::Text(self.name.clone()),
            StudentField::StudentId => FieldValue::Text(self.student_id.clone()),
            StudentField::CumGpa => FieldValue::Real(self.cumulative_gpa),
            StudentField::Major => FieldValue::Text(self.major.clone()),
            StudentField::Classification => FieldValue::Text(self.classification.clone()),
            StudentField::EarnedCredits => FieldValue::Integer(self.earned_credits),
            StudentField::Enrolled => FieldValue::Text(self.enrolled.clone()),
            StudentField::Email => FieldValue::Text(self.email.clone()),
            StudentField::Gender => FieldValue::Text(self.gender.clone()),
            StudentField::InState => FieldValue::Text(self.in_state.clone()),
        }
    }

    /// `(field, value)` pairs in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (StudentField, FieldValue)> + '_ {
        StudentField::ALL
            .into_iter()
            .map(move |field| (field, self.value(field)))
    }

    /// Positional form used for row insertion.
    pub fn to_tuple(&self) -> StudentTuple {
        (
            self.name.clone(),
            self.student_id.clone(),
            self.cumulative_gpa,
            self.major.clone(),
            self.classification.clone(),
            self.earned_credits,
            self.enrolled.clone(),
            self.email.clone(),
            self.gender.clone(),
            self.in_state.clone(),
        )
    }

    /// Rebuild a record from a stored row. No validation happens here; rows
    /// were checked on their way in.
    pub fn from_tuple(tuple: StudentTuple) -> Self {
        let (
            name,
            student_id,
            cumulative_gpa,
            major,
            classification,
            earned_credits,
            enrolled,
            email,
            gender,
            in_state,
        ) = tuple;
        Self {
            name,
            student_id,
            cumulative_gpa,
            major,
            classification,
            earned_credits,
            enrolled,
            email,
            gender,
            in_state,
        }
    }

    /// Insertion-ordered mapping keyed by column name.
    pub fn to_map(&self) -> Map<String, Value> {
        self.fields()
            .map(|(field, value)| (field.column().to_string(), value.into()))
            .collect()
    }

    /// Coerce raw text, given in canonical column order, into a record.
    pub fn from_text_values(values: [&str; 10]) -> Result<Self> {
        let [name, student_id, gpa, major, classification, credits, enrolled, email, gender, in_state] =
            values;

        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Err(ScholarlyError::malformed_record(
                StudentField::StudentId.column(),
                student_id,
                "student id must not be empty",
            ));
        }

        Ok(Self {
            name: name.to_string(),
            student_id: student_id.to_string(),
            cumulative_gpa: parse_gpa(gpa)?,
            major: major.trim().to_string(),
            classification: classification.trim().to_string(),
            earned_credits: parse_credits(credits)?,
            enrolled: parse_yes_no(StudentField::Enrolled, enrolled)?,
            email: email.trim().to_string(),
            gender: gender.trim().to_string(),
            in_state: parse_yes_no(StudentField::InState, in_state)?,
        })
    }
}

impl fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_map()))
    }
}

fn parse_gpa(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(gpa) if gpa.is_finite() => Ok(gpa),
        _ => Err(ScholarlyError::malformed_record(
            StudentField::CumGpa.column(),
            raw,
            "expected a decimal number",
        )),
    }
}

/// Spreadsheet exports often write whole numbers as `120.0`; those are
/// accepted, anything with a fractional part is not.
fn parse_credits(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(credits) = trimmed.parse::<i64>() {
        return Ok(credits);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => Ok(value as i64),
        _ => Err(ScholarlyError::malformed_record(
            StudentField::EarnedCredits.column(),
            raw,
            "expected a whole number",
        )),
    }
}

fn parse_yes_no(field: StudentField, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("yes") || trimmed.eq_ignore_ascii_case("no") {
        Ok(trimmed.to_string())
    } else {
        Err(ScholarlyError::malformed_record(
            field.column(),
            raw,
            "expected Yes or No",
        ))
    }
}
