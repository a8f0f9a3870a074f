//! End-to-end trace matrix runs over files on disk

use std::collections::HashSet;

use tempfile::TempDir;
use vvtrace_core::{
    builder::TraceMatrixBuilder,
    config::DomainPrefixes,
    export::{
        self,
        OutputFormat,
    },
    inputs::{
        load_batches,
        load_id_list,
        load_links,
        load_trace_matrix,
    },
    validate::{
        Check,
        Validator,
    },
    ReferenceLists,
    RejectReason,
    TestMethod,
    TestRecord,
    TestStatus,
    TraceConfig,
    TracePipeline,
    TraceRow,
};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_automated_name_fans_out_per_reference() {
    let builder = TraceMatrixBuilder::new("TC", DomainPrefixes {
        manual:    vec!["PRD".to_string()],
        automatic: vec!["PRD".to_string()],
    })
    .unwrap();
    let record = TestRecord::new(
        "PRD100 automated regression for TC200 TC201",
        TestStatus::Failed,
        TestMethod::Automatic,
    )
    .with_report_id("0012345 v02");

    let output = builder.build(&[record]);
    let srs: Vec<_> = output.rows.iter().map(|row| row.srs_id.as_str()).collect();
    assert_eq!(srs, vec!["TC200", "TC201"]);
    assert!(output.rows.iter().all(|row| row.report_id == "0012345 v02"));
}

#[test]
fn test_any_versus_all_prd_checks() {
    let references = ReferenceLists::new(["US10", "US11"], Vec::<String>::new());
    let validator = Validator::new("US", "TC", references);

    let record = TestRecord::new("SRS TC1 login", TestStatus::Passed, TestMethod::Manual);
    let multi_prd = TraceRow::from_record(&record, "TC1").with_prd("US10, US99");
    let partition = validator.check(Check::PrdReferencedBySrsExists, vec![multi_prd]);
    assert_eq!(partition.valid.len(), 1);

    let record = TestRecord::new("SRS TC1 covers US10 US99", TestStatus::Passed, TestMethod::Manual);
    let named_prds = TraceRow::from_record(&record, "TC1").with_prd("US10");
    let partition = validator.check(Check::PrdExists, vec![named_prds]);
    assert_eq!(partition.invalid.len(), 1);
    assert_eq!(
        partition.invalid[0].error_reason,
        RejectReason::PrdReferencedByTestMissing
    );
}

#[test]
fn test_run_from_files() {
    let dir = TempDir::new().unwrap();
    let prd = write(&dir, "prd.csv", "Formatted ID,Name\nUS10,Login\nUS11,Logout\n");
    let obsolete = write(&dir, "obsolete.csv", "ID\nTC999\n");
    let links = write(&dir, "links.csv", "PRD,SRS\nUS10,TC1\nUS10,TC3\nUS11,TC3\n");
    write(
        &dir,
        "logs/Rx/protocol.json",
        r#"{"source":"protocol_log","report_id":"0012345 v02","records":[
            {"test_name":"TC1 pairing","status":"PASSED"},
            {"test_name":"TC3 unpair TC999","status":"Failed"},
            {"test_name":"TC4 firmware","status":"skipped"}
        ]}"#,
    );
    write(
        &dir,
        "logs/perf.json",
        r#"{"source":"performance","records":[{"test_name":"TC3 latency","status":"PASS","report_id":"0012399 v01"}]}"#,
    );

    let references = ReferenceLists {
        active_prd_ids:   load_id_list(&prd).unwrap(),
        obsolete_srs_ids: load_id_list(&obsolete).unwrap(),
    };
    assert_eq!(
        references.active_prd_ids,
        HashSet::from(["US10".to_string(), "US11".to_string()])
    );

    let batches = load_batches(&[dir.path().join("logs")], Some(TestMethod::Automatic)).unwrap();
    assert_eq!(batches.len(), 2);

    let pipeline = TracePipeline::new(TraceConfig::default(), references)
        .unwrap()
        .with_links(load_links(&links).unwrap());
    let output = pipeline.run(&batches);

    let matrix: Vec<_> = output
        .matrix
        .iter()
        .map(|row| (row.srs_id.as_str(), row.prd.as_deref(), row.test_name.as_str()))
        .collect();
    assert_eq!(
        matrix,
        vec![
            ("TC1", Some("US10"), "TC1 pairing"),
            ("TC3", Some("US10, US11"), "TC3 latency"),
        ]
    );

    let reasons: Vec<_> = output.error_log.rows().iter().map(|row| row.error_reason).collect();
    assert_eq!(
        reasons,
        vec![
            RejectReason::InvalidStatus,
            RejectReason::SrsWithoutPrd,
            RejectReason::ObsoleteSrs,
        ]
    );

    let matrix_path = dir.path().join("out").join("trace_matrix.csv");
    let errors_path = dir.path().join("out").join("trace_errors.csv");
    export::write_outputs(&output, &matrix_path, &errors_path, OutputFormat::Csv).unwrap();

    let written = std::fs::read_to_string(&matrix_path).unwrap();
    assert!(written.contains("\"US10, US11\",TC3,TC3 latency,Passed,,,,Automatic,0012399 v01"));
    assert_eq!(std::fs::read_to_string(&errors_path).unwrap().lines().count(), 4);
}

#[test]
fn test_existing_matrix_from_file() {
    let dir = TempDir::new().unwrap();
    let prd = write(&dir, "prd.csv", "\u{feff}ID\nUS10\nUS11\nUS12\n");
    let obsolete = write(&dir, "obsolete.csv", "\u{feff}Formatted ID,Name\nTC999,old\n");
    let matrix = write(
        &dir,
        "trace_matrix.csv",
        "PRD,SRS ID,Test Name,Test Status,Release,Owner,Application,Method,V&V Test Report\n\
         US10,TC1,SRS TC1 login,Passed,1.33.0,qa,portal,Manual,0012345 v02\n\
         US11,N/A,,,,,,,\n\
         US12,TC2,TC2,Failed,,,,Automatic,\n\
         US10,TC999,SRS TC999 legacy,Passed,,,,Manual,\n",
    );

    let references = ReferenceLists {
        active_prd_ids:   load_id_list(&prd).unwrap(),
        obsolete_srs_ids: load_id_list(&obsolete).unwrap(),
    };
    assert_eq!(references.active_prd_ids.len(), 3);
    assert!(references.obsolete_srs_ids.contains("TC999"));

    let pipeline = TracePipeline::new(TraceConfig::default(), references)
        .unwrap()
        .with_trace_rows(load_trace_matrix(&matrix).unwrap());
    let output = pipeline.run(&[]);

    assert_eq!(output.matrix.len(), 1);
    assert_eq!(output.matrix[0].srs_id, "TC1");
    assert_eq!(output.matrix[0].release, "1.33.0");

    let rejected: Vec<_> = output
        .error_log
        .rows()
        .iter()
        .map(|row| (row.error_reason, row.prd.as_deref(), row.srs_id.as_deref()))
        .collect();
    assert_eq!(
        rejected,
        vec![
            (RejectReason::PrdWithoutSrs, Some("US11"), Some("N/A")),
            (RejectReason::SrsWithoutTest, Some("US12"), Some("TC2")),
            (RejectReason::ObsoleteSrs, Some("US10"), Some("TC999")),
        ]
    );
    assert_eq!(output.summary.supplied_rows, 4);
}
