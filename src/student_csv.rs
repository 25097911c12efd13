//! CSV reading and writing for student data. The header row decides which
//! column feeds which field, so columns may come in any order, but every
//! field must be present exactly once.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use crate::error::{Result, ScholarlyError};
use crate::models::{StudentField, StudentRecord};

const HEADER_ROW: u64 = 1;

/// Parse every student in the CSV file at `path`.
pub fn read_students(path: &Path) -> Result<Vec<StudentRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|err| csv_failure(path, err))?;
    let students = collect_students(reader, path)?;
    debug!(path = %path.display(), rows = students.len(), "parsed student CSV");
    Ok(students)
}

/// Parse students from any reader; `label` names the source in errors.
pub fn read_students_from<R: Read>(input: R, label: &Path) -> Result<Vec<StudentRecord>> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);
    collect_students(reader, label)
}

fn collect_students<R: Read>(mut reader: csv::Reader<R>, label: &Path) -> Result<Vec<StudentRecord>> {
    let headers = reader
        .headers()
        .map_err(|err| csv_failure(label, err))?
        .clone();
    let columns = map_headers(&headers)?;

    let mut students = Vec::new();
    let mut seen_ids: HashMap<String, u64> = HashMap::new();

    for result in reader.records() {
        let record = result.map_err(|err| csv_failure(label, err))?;
        let row = record.position().map_or(0, |pos| pos.line());

        let mut values = [""; 10];
        for (idx, field) in columns.iter().enumerate() {
            values[*field as usize] = record.get(idx).unwrap_or("");
        }

        let student = StudentRecord::from_text_values(values).map_err(|err| {
            ScholarlyError::MalformedCsv {
                row,
                message: err.to_string(),
            }
        })?;

        if let Some(first) = seen_ids.insert(student.student_id.clone(), row) {
            return Err(ScholarlyError::MalformedCsv {
                row,
                message: format!(
                    "student id '{}' already appears on row {first}",
                    student.student_id
                ),
            });
        }
        students.push(student);
    }

    Ok(students)
}

/// Resolve each header cell to a field, rejecting unknown, repeated, and
/// missing columns.
fn map_headers(headers: &StringRecord) -> Result<Vec<StudentField>> {
    if headers.iter().all(|cell| cell.trim().is_empty()) {
        return Err(ScholarlyError::MalformedCsv {
            row: HEADER_ROW,
            message: "missing header row".into(),
        });
    }

    let mut columns = Vec::with_capacity(headers.len());
    for cell in headers.iter() {
        let field = StudentField::resolve(cell.trim_start_matches('\u{feff}'))?;
        if columns.contains(&field) {
            return Err(ScholarlyError::MalformedCsv {
                row: HEADER_ROW,
                message: format!("column '{field}' appears more than once"),
            });
        }
        columns.push(field);
    }

    let missing: Vec<_> = StudentField::ALL
        .iter()
        .filter(|field| !columns.contains(field))
        .map(|field| field.column())
        .collect();
    if !missing.is_empty() {
        return Err(ScholarlyError::MalformedCsv {
            row: HEADER_ROW,
            message: format!("missing columns: {}", missing.join(", ")),
        });
    }

    Ok(columns)
}

/// Write students to `path` with canonical headers, overwriting the file.
pub fn write_students(path: &Path, students: &[StudentRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| csv_failure(path, err))?;

    writer
        .write_record(StudentRecord::headers())
        .map_err(|err| csv_failure(path, err))?;
    for student in students {
        writer
            .serialize(student)
            .map_err(|err| csv_failure(path, err))?;
    }
    writer.flush().map_err(|source| ScholarlyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = students.len(), "wrote student CSV");
    Ok(())
}

fn csv_failure(path: &Path, err: csv::Error) -> ScholarlyError {
    let row = err.position().map_or(HEADER_ROW, |pos| pos.line());
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ScholarlyError::Io {
            path: path.to_path_buf(),
            source,
        },
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => ScholarlyError::MalformedCsv {
            row,
            message: format!("expected {expected_len} fields, found {len}"),
        },
        _ => ScholarlyError::MalformedCsv { row, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "name,student_ID,cum_gpa,major,classification,earned_credits,enrolled,email,gender,in_state";

    fn parse(body: &str) -> Result<Vec<StudentRecord>> {
        read_students_from(body.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn reads_rows_in_file_order() {
        let csv = format!(
            "{HEADER}\n\
             \"Curie, Marie\",M1,3.9,Physics,Senior,120,Yes,marie@x.edu,F,No\n\
             \"Turing, Alan\",M2,4.0,CS,Junior,90,yes,alan@x.edu,M,YES\n"
        );
        let students = parse(&csv).unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Curie, Marie");
        assert_eq!(students[1].student_id, "M2");
        assert_eq!(students[1].cumulative_gpa, 4.0);
    }

    #[test]
    fn columns_may_be_reordered() {
        let csv = "student_id,name,in_state,gender,email,enrolled,earned_credits,classification,major,cumulative_gpa\n\
                   M9,Ng,No,F,ng@x.edu,Yes,30,Freshman,Art,2.5\n";
        let students = parse(csv).unwrap();
        assert_eq!(students[0].student_id, "M9");
        assert_eq!(students[0].major, "Art");
        assert_eq!(students[0].cumulative_gpa, 2.5);
        assert_eq!(students[0].earned_credits, 30);
    }

    #[test]
    fn short_row_names_the_row() {
        let csv = format!(
            "{HEADER}\nA,M1,3.9,Physics,Senior,120,Yes,a@x.edu,F,No\nB,M2,3.1,Art\n"
        );
        let err = parse(&csv).unwrap_err();
        assert!(
            matches!(err, ScholarlyError::MalformedCsv { row: 3, .. }),
            "{err}"
        );
    }

    #[test]
    fn bad_value_names_the_row() {
        let csv = format!("{HEADER}\nA,M1,abc,Physics,Senior,120,Yes,a@x.edu,F,No\n");
        let err = parse(&csv).unwrap_err();
        match err {
            ScholarlyError::MalformedCsv { row, message } => {
                assert_eq!(row, 2);
                assert!(message.contains("cum_gpa"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn duplicate_student_id_is_rejected() {
        let csv = format!(
            "{HEADER}\nA,M1,3.9,Physics,Senior,120,Yes,a@x.edu,F,No\nB,M1,3.1,Art,Senior,100,Yes,b@x.edu,M,No\n"
        );
        let err = parse(&csv).unwrap_err();
        assert!(matches!(err, ScholarlyError::MalformedCsv { row: 3, .. }));
    }

    #[test]
    fn header_problems_are_reported() {
        let unknown = "name,student_id,cum_gpa,major,classification,earned_credits,enrolled,email,gender,in_state,shoe_size\n";
        assert!(matches!(
            parse(unknown),
            Err(ScholarlyError::UnknownField(name)) if name == "shoe_size"
        ));

        let missing = "name,student_id,cum_gpa\n";
        assert!(matches!(
            parse(missing),
            Err(ScholarlyError::MalformedCsv { row: 1, message }) if message.contains("major")
        ));

        let repeated = "name,name,student_id,cum_gpa,major,classification,earned_credits,enrolled,email,gender,in_state\n";
        assert!(matches!(
            parse(repeated),
            Err(ScholarlyError::MalformedCsv { row: 1, .. })
        ));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let csv = format!("{HEADER}\n\"Curie, Marie\",M1,3.9,Physics,Senior,120,Yes,marie@x.edu,F,No\n");
        let students = parse(&csv).unwrap();

        write_students(&path, &students).unwrap();
        assert_eq!(read_students(&path).unwrap(), students);

        write_students(&path, &[]).unwrap();
        assert!(read_students(&path).unwrap().is_empty());
    }
}
