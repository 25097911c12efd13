use std::fs;
use std::path::PathBuf;

use scholarly::{
    translate, AwardCriteriaRecord, Scholarly, ScholarlyError, StoreConfig, StudentBackend,
    StudentRecord,
};
use serde_json::{json, Map};
use tempfile::TempDir;

const HEADER: &str =
    "name,student_ID,cum_gpa,major,classification,earned_credits,enrolled,email,gender,in_state";

fn setup() -> (TempDir, Scholarly) {
    let dir = tempfile::tempdir().unwrap();
    let scholarly = Scholarly::new(StoreConfig::new(dir.path().join("scholarly.sqlite")));
    (dir, scholarly)
}

fn write_csv(dir: &TempDir, file: &str, rows: &[&str]) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, format!("{HEADER}\n{}\n", rows.join("\n"))).unwrap();
    path
}

fn ids(students: &[StudentRecord]) -> Vec<String> {
    students.iter().map(|s| s.student_id.clone()).collect()
}

fn roster(dir: &TempDir) -> PathBuf {
    write_csv(
        dir,
        "roster.csv",
        &[
            "\"Ada, A\",A,4.0,CS,Senior,110,Yes,a@x.edu,F,Yes",
            "\"Bo, B\",B,3.5,Math,Junior,75,Yes,b@x.edu,M,No",
            "\"Cy, C\",C,3.9,cs,Senior,105,No,c@x.edu,F,yes",
        ],
    )
}

#[test]
fn award_selects_case_insensitive_major_and_numeric_gpa() {
    let (dir, scholarly) = setup();
    scholarly.open_file(&roster(&dir)).unwrap();
    scholarly
        .awards()
        .bulk_load(vec![json!({
            "name": "Stem Excellence",
            "criteria": {"major": {"$in": ["CS"]}, "cum_gpa": {"$gte": 3.8}}
        })])
        .unwrap();

    let recipients = scholarly.select_recipients("stem excellence").unwrap();
    assert_eq!(ids(&recipients), ["A", "C"]);
    assert_eq!(recipients[0].cumulative_gpa, 4.0);
    assert_eq!(recipients[1].cumulative_gpa, 3.9);
    assert_eq!(recipients[0].name, "Ada, A");
}

#[test]
fn empty_criteria_matches_select_all() {
    let (dir, scholarly) = setup();
    let all = scholarly.open_file(&roster(&dir)).unwrap();
    scholarly
        .awards()
        .insert(AwardCriteriaRecord::new("Everyone", Map::new()))
        .unwrap();

    assert_eq!(scholarly.select_recipients("Everyone").unwrap(), all);
    assert_eq!(ids(&all), ["A", "C", "B"]);
}

#[test]
fn limit_truncates_sorted_candidates() {
    let (dir, scholarly) = setup();
    scholarly.open_file(&roster(&dir)).unwrap();
    scholarly
        .awards()
        .bulk_load(vec![
            json!({"name": "Top One", "criteria": {}, "limit": 1}),
            json!({"name": "Top Five", "criteria": {"gender": "f"}, "limit": 5}),
            json!({"name": "Fewest Credits", "criteria": {}, "limit": 2,
                   "sort": [["earned_credits", 1]]}),
        ])
        .unwrap();

    assert_eq!(ids(&scholarly.select_recipients("Top One").unwrap()), ["A"]);
    assert_eq!(ids(&scholarly.select_recipients("Top Five").unwrap()), ["A", "C"]);
    assert_eq!(
        ids(&scholarly.select_recipients("Fewest Credits").unwrap()),
        ["B", "C"]
    );
}

#[test]
fn unsupported_operators_are_never_stored() {
    let (_dir, scholarly) = setup();
    let awards = scholarly.awards();

    let err = awards
        .insert(AwardCriteriaRecord::new(
            "Lte",
            json!({"cum_gpa": {"$lte": 3.0}}).as_object().unwrap().clone(),
        ))
        .unwrap_err();
    assert!(matches!(err, ScholarlyError::UnsupportedOperator { .. }));

    let err = awards
        .bulk_load(vec![
            json!({"name": "Fine", "criteria": {"major": "CS"}}),
            json!({"name": "Regex", "criteria": {"major": {"$regex": "C.*"}}}),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        ScholarlyError::UnsupportedOperator { ref operator, .. } if operator == "$regex"
    ));

    let err = awards
        .bulk_load(vec![json!({"name": "Anything", "criteria": {"major": {}}})])
        .unwrap_err();
    assert!(matches!(err, ScholarlyError::InvalidCriteria { .. }));

    assert!(awards.get_all().unwrap().is_empty());
}

#[test]
fn unknown_fields_fail_at_selection() {
    let (dir, scholarly) = setup();
    scholarly.open_file(&roster(&dir)).unwrap();
    scholarly
        .awards()
        .bulk_load(vec![
            json!({"name": "Hometown", "criteria": {"hometown": "Dallas"}}),
            json!({"name": "Odd Sort", "criteria": {}, "sort": [["height", -1]]}),
        ])
        .unwrap();

    assert!(matches!(
        scholarly.select_recipients("Hometown"),
        Err(ScholarlyError::UnknownField(field)) if field == "hometown"
    ));
    assert!(matches!(
        scholarly.select_recipients("Odd Sort"),
        Err(ScholarlyError::UnknownField(field)) if field == "height"
    ));
}

#[test]
fn duplicate_award_name_leaves_single_entry() {
    let (_dir, scholarly) = setup();
    let awards = scholarly.awards();
    awards
        .insert(AwardCriteriaRecord::new("Tom C. White", Map::new()))
        .unwrap();
    let err = awards
        .insert(AwardCriteriaRecord::new("TOM C. WHITE", Map::new()))
        .unwrap_err();
    assert!(matches!(err, ScholarlyError::DuplicateName(_)));

    let all = awards.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Tom C. White");
}

#[test]
fn reopening_replaces_students_and_closing_clears_them() {
    let (dir, scholarly) = setup();
    let five = write_csv(
        &dir,
        "five.csv",
        &[
            "A,S1,3.0,CS,Senior,100,Yes,a@x,F,Yes",
            "B,S2,3.1,CS,Senior,100,Yes,b@x,M,Yes",
            "C,S3,3.2,CS,Senior,100,Yes,c@x,F,No",
            "D,S4,3.3,CS,Senior,100,Yes,d@x,M,No",
            "E,S5,3.4,CS,Senior,100,Yes,e@x,M,No",
        ],
    );
    let three = write_csv(
        &dir,
        "three.csv",
        &[
            "F,S6,3.0,CS,Senior,100,Yes,f@x,F,Yes",
            "G,S7,3.1,CS,Senior,100,Yes,g@x,M,Yes",
            "H,S8,3.2,CS,Senior,100,Yes,h@x,F,No",
        ],
    );

    assert_eq!(scholarly.open_file(&five).unwrap().len(), 5);
    assert_eq!(scholarly.open_file(&three).unwrap().len(), 3);
    assert_eq!(scholarly.students().count().unwrap(), 3);

    scholarly.close_file().unwrap();
    assert!(!scholarly.students().is_loaded().unwrap());
    assert!(scholarly.students().select_all().unwrap().is_empty());
}

#[test]
fn awards_survive_closing_the_student_file() {
    let (dir, scholarly) = setup();
    scholarly.open_file(&roster(&dir)).unwrap();
    scholarly
        .awards()
        .insert(AwardCriteriaRecord::new("Merit", Map::new()))
        .unwrap();

    scholarly.close_file().unwrap();
    assert!(scholarly.select_recipients("Merit").unwrap().is_empty());
    assert_eq!(scholarly.awards().get_all().unwrap().len(), 1);
}

#[test]
fn stores_with_separate_tables_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite");
    let spring = Scholarly::new(
        StoreConfig::new(&path)
            .with_table_names("spring_students", "spring_awards")
            .unwrap(),
    );
    let fall = Scholarly::new(
        StoreConfig::new(&path)
            .with_table_names("fall_students", "fall_awards")
            .unwrap(),
    );

    spring.open_file(&roster(&dir)).unwrap();
    assert_eq!(spring.students().count().unwrap(), 3);
    assert_eq!(fall.students().count().unwrap(), 0);

    fall.students().drop_table().unwrap();
    assert_eq!(spring.students().count().unwrap(), 3);
}

#[test]
fn translation_is_repeatable_for_stored_awards() {
    let (_dir, scholarly) = setup();
    scholarly
        .awards()
        .bulk_load(vec![json!({
            "name": "Mixed",
            "criteria": {"in_state": "Yes", "earned_credits": {"$gte": 90}, "major": {"$in": ["CS", "Math"]}},
            "limit": 4
        })])
        .unwrap();

    let award = scholarly.awards().get_by_name("mixed").unwrap().unwrap();
    let first = translate(&award).unwrap();
    assert_eq!(first, translate(&award).unwrap());
    let fields: Vec<_> = first.predicates.iter().map(|p| p.field()).collect();
    assert_eq!(fields, ["in_state", "earned_credits", "major"]);
}
