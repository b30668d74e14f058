//! File-level pipeline behaviour: outputs, naming and per-document isolation

mod common;

use common::{config, diary, timestamp, write_fixture, TeiBuilder};
use nerhelper::table::{read_rows_from_path, write_rows_to_path};
use nerhelper::{check_well_formed, Pipeline, PipelineError, ProvenanceRecord};
use std::path::PathBuf;

fn record() -> ProvenanceRecord {
    ProvenanceRecord::with_timestamp(&config().provenance, timestamp())
}

#[test]
fn malformed_document_fails_alone() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let good = write_fixture(input.path(), "diary.xml", &diary());
    let bad = write_fixture(input.path(), "broken.xml", "<TEI><text><body></TEI>");
    let missing = input.path().join("missing.xml");

    let pipeline = Pipeline::new(config(), out.path());
    let report = pipeline.suggest_batch(&[bad, good, missing]);

    assert!(!report.is_success());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].file.ends_with("broken.xml"));
    assert!(report.failed[0].error.contains("not well-formed"));

    let table = out.path().join("diary.csv");
    assert_eq!(report.succeeded[0].table, table);
    assert_eq!(read_rows_from_path(&table).unwrap().len(), 3);
    assert!(!out.path().join("broken.csv").exists());
}

#[test]
fn report_serializes_to_json() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let good = write_fixture(input.path(), "diary.xml", &diary());

    let report = Pipeline::new(config(), out.path()).suggest_batch(&[good]);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["succeeded"][0]["document"], "diary.xml");
    assert_eq!(json["succeeded"][0]["suggestions"], 3);
    assert_eq!(json["succeeded"][0]["already_encoded"], 1);
    assert!(json["failed"].as_array().unwrap().is_empty());
}

#[test]
fn revise_writes_prefixed_output() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let xml = write_fixture(input.path(), "diary.xml", &diary());
    let pipeline = Pipeline::new(config(), out.path());

    let suggested = pipeline.suggest_file(&xml).unwrap();
    let mut rows = read_rows_from_path(&suggested.table).unwrap();
    rows[0].accept = true;
    rows[0].reference_id = Some("abel-mr".into());
    rows[2].accept = true;
    let mut foreign = rows[1].clone();
    foreign.file = "other.xml".into();
    foreign.accept = true;
    rows.push(foreign);
    write_rows_to_path(&suggested.table, &rows).unwrap();

    let outcome = pipeline.revise_file(&xml, &suggested.table, record()).unwrap();
    assert_eq!(outcome.output, out.path().join("revised-diary.xml"));
    assert_eq!(outcome.fragments_changed, 2);
    assert_eq!(outcome.applied, 2);
    assert_eq!(outcome.ignored_rows, 1);
    assert!(outcome.violations.is_empty());

    let written = std::fs::read_to_string(&outcome.output).unwrap();
    assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?> <?xml-model"));
    assert!(written.contains("<persRef ref=\"abel-mr\" type=\"human-added\">Abel</persRef>"));
    assert!(written.contains("<placeName type=\"human-added\">Quincy</placeName>"));
    assert!(!written.contains("<placeName type=\"human-added\">Boston"));
    assert!(check_well_formed(&written).is_ok());
}

#[test]
fn policy_violations_are_reported_not_applied() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let xml = write_fixture(input.path(), "diary.xml", &diary());
    let pipeline = Pipeline::new(config(), out.path());

    let suggested = pipeline.suggest_file(&xml).unwrap();
    let mut rows = read_rows_from_path(&suggested.table).unwrap();
    rows[0].accept = true;
    write_rows_to_path(&suggested.table, &rows).unwrap();

    let outcome = pipeline.revise_file(&xml, &suggested.table, record()).unwrap();
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.fragments_changed, 0);
    let written = std::fs::read_to_string(&outcome.output).unwrap();
    assert!(written.contains("<p>Mr. Abel lived in Boston.</p>"));
}

#[test]
fn unknown_location_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let xml = write_fixture(input.path(), "diary.xml", &diary());
    let csv = write_fixture(
        input.path(),
        "diary.csv",
        "accept,entity,category,reference_id,location_path,sequence_index,file\n\
         y,Boston,GPE,,body//div[9]/p,40,diary.xml\n",
    );

    let pipeline = Pipeline::new(config(), out.path());
    let err = pipeline.revise_file(&xml, &csv, record()).unwrap_err();
    assert!(matches!(err, PipelineError::Revise { .. }));
    assert!(!out.path().join("revised-diary.xml").exists());
}

#[test]
fn document_without_docbody_yields_empty_table() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let xml = write_fixture(input.path(), "empty.xml", &TeiBuilder::new().build());

    let outcome = Pipeline::new(config(), out.path())
        .suggest_file(&xml)
        .unwrap();
    assert_eq!(outcome.suggestions, 0);
    let table: PathBuf = out.path().join("empty.csv");
    assert!(table.exists());
    assert!(read_rows_from_path(&table).unwrap().is_empty());
}

#[test]
fn revise_without_header_writes_unstamped_output() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let source = TeiBuilder::new()
        .without_header()
        .div(Some("d1"), &["<p>Mr. Abel lived in Boston.</p>"])
        .build();
    let xml = write_fixture(input.path(), "bare.xml", &source);
    let pipeline = Pipeline::new(config(), out.path());

    let suggested = pipeline.suggest_file(&xml).unwrap();
    let mut rows = read_rows_from_path(&suggested.table).unwrap();
    let boston = rows.iter_mut().find(|r| r.entity == "Boston").unwrap();
    boston.accept = true;
    write_rows_to_path(&suggested.table, &rows).unwrap();

    let outcome = pipeline.revise_file(&xml, &suggested.table, record()).unwrap();
    assert_eq!(outcome.applied, 1);
    let written = std::fs::read_to_string(&outcome.output).unwrap();
    assert!(written.contains("<placeName type=\"human-added\">Boston</placeName>"));
    assert!(!written.contains("<teiHeader"));
    assert!(!written.contains("<change "));
}
