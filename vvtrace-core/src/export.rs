//! Trace matrix and error log export
//!
//! Both tables are rendered in full before anything is written, so a render
//! failure leaves no partial output behind. The two files are then staged
//! next to their destinations and only renamed into place once both are
//! written.

use std::{
    ffi::OsString,
    fmt,
    fs::File,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    aggregate::ErrorLog,
    delimited::join_record,
    error::{
        TraceError,
        TraceResult,
    },
    pipeline::{
        PipelineOutput,
        RunSummary,
    },
    trace::{
        RejectedRow,
        TraceRow,
    },
};

/// Trace matrix columns
pub const MATRIX_HEADERS: [&str; 9] = [
    "PRD",
    "SRS ID",
    "Test Name",
    "Test Status",
    "Release",
    "Owner",
    "Application",
    "Method",
    "V&V Test Report",
];

/// Error log columns
pub const ERROR_LOG_HEADERS: [&str; 10] = [
    "Error",
    "PRD",
    "SRS ID",
    "Test Name",
    "Test Status",
    "Release",
    "Owner",
    "Application",
    "Method",
    "V&V Test Report",
];

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Pretty-printed JSON array of row objects
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

fn matrix_record(row: &TraceRow) -> [String; 9] {
    [
        row.prd.clone().unwrap_or_default(),
        row.srs_id.clone(),
        row.test_name.clone(),
        row.status.to_string(),
        row.release.clone(),
        row.owner.clone(),
        row.application.clone(),
        row.method.to_string(),
        row.report_id.clone(),
    ]
}

fn error_record(row: &RejectedRow) -> [String; 10] {
    [
        row.error_reason.to_string(),
        row.prd.clone().unwrap_or_default(),
        row.srs_id.clone().unwrap_or_default(),
        row.test_name.clone(),
        row.status.clone(),
        row.release.clone(),
        row.owner.clone(),
        row.application.clone(),
        row.method.to_string(),
        row.report_id.clone(),
    ]
}

fn to_csv<const N: usize>(headers: &[&str; N], records: impl Iterator<Item = [String; N]>) -> String {
    let mut out = join_record(headers);
    out.push('\n');
    for record in records {
        out.push_str(&join_record(&record));
        out.push('\n');
    }
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> TraceResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TraceError::Export(format!("Failed to serialize {}: {}", what, e)))
}

/// Render the trace matrix as CSV
pub fn matrix_to_csv(rows: &[TraceRow]) -> String {
    to_csv(&MATRIX_HEADERS, rows.iter().map(matrix_record))
}

/// Render the error log as CSV
pub fn error_log_to_csv(log: &ErrorLog) -> String {
    to_csv(&ERROR_LOG_HEADERS, log.rows().iter().map(error_record))
}

/// Render the trace matrix in `format`
pub fn render_matrix(rows: &[TraceRow], format: OutputFormat) -> TraceResult<String> {
    match format {
        OutputFormat::Csv => Ok(matrix_to_csv(rows)),
        OutputFormat::Json => to_json(rows, "trace matrix"),
    }
}

/// Render the error log in `format`
pub fn render_error_log(log: &ErrorLog, format: OutputFormat) -> TraceResult<String> {
    match format {
        OutputFormat::Csv => Ok(error_log_to_csv(log)),
        OutputFormat::Json => to_json(log.rows(), "error log"),
    }
}

/// Render the run summary as JSON
pub fn summary_to_json(summary: &RunSummary) -> TraceResult<String> {
    to_json(summary, "run summary")
}

/// Write `content` to `path`, creating parent directories
pub fn write_output(path: &Path, content: &str) -> TraceResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            TraceError::Export(format!(
                "Failed to create output directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = File::create(path).map_err(|e| {
        TraceError::Export(format!("Failed to create {}: {}", path.display(), e))
    })?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Sibling of `path` that output is written to before it is moved into
/// place
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (staging, _) in staged {
        let _ = std::fs::remove_file(staging);
    }
}

/// Write the matrix and the error log of a finished run
///
/// Either both files are replaced or neither is: if staging one of them
/// fails, the other is discarded and the destinations are left untouched.
pub fn write_outputs(
    output: &PipelineOutput,
    matrix_path: &Path,
    error_log_path: &Path,
    format: OutputFormat,
) -> TraceResult<()> {
    let matrix = render_matrix(&output.matrix, format)?;
    let error_log = render_error_log(&output.error_log, format)?;

    let mut staged = Vec::with_capacity(2);
    for (path, content) in [(matrix_path, &matrix), (error_log_path, &error_log)] {
        let staging = staging_path(path);
        if let Err(e) = write_output(&staging, content) {
            discard(&staged);
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        staged.push((staging, path));
    }

    for (index, (staging, path)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(staging, path) {
            discard(&staged[index..]);
            return Err(TraceError::Export(format!(
                "Failed to move output into {}: {}",
                path.display(),
                e
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::trace::{
        RejectReason,
        TestMethod,
        TestRecord,
        TestStatus,
    };

    fn row() -> TraceRow {
        let record = TestRecord::new("SRS TC1 login, logout", TestStatus::Passed, TestMethod::Manual)
            .with_report_id("0012345 v02")
            .with_release("1.33.0")
            .with_owner("qa")
            .with_application("portal");
        TraceRow::from_record(&record, "TC1").with_prd("US10, US11")
    }

    #[test]
    fn test_matrix_csv() {
        let csv = matrix_to_csv(&[row()]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("PRD,SRS ID,Test Name,Test Status,Release,Owner,Application,Method,V&V Test Report")
        );
        assert_eq!(
            lines.next(),
            Some("\"US10, US11\",TC1,\"SRS TC1 login, logout\",Passed,1.33.0,qa,portal,Manual,0012345 v02")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_tables_keep_headers() {
        assert_eq!(matrix_to_csv(&[]).lines().count(), 1);
        let csv = error_log_to_csv(&ErrorLog::new());
        assert!(csv.starts_with("Error,PRD,SRS ID,"));
        assert_eq!(render_matrix(&[], OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_error_log_csv_leads_with_reason() {
        let record = TestRecord::new("notes", TestStatus::Failed, TestMethod::Manual);
        let mut log = ErrorLog::new();
        log.push_batch(vec![
            RejectedRow::from_record(&record, RejectReason::NotPartOfTrace),
            RejectedRow::from_row(row(), RejectReason::ObsoleteSrs),
        ]);

        let csv = error_log_to_csv(&log);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "test not part of trace,,,notes,Failed,,,,Manual,");
        assert!(lines[2].starts_with("Test references obsolete SRS,\"US10, US11\",TC1,"));
    }

    #[test]
    fn test_matrix_json() {
        let json = render_matrix(&[row()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["srs_id"], "TC1");
        assert_eq!(value[0]["prd"], "US10, US11");
        assert_eq!(value[0]["status"], "Passed");
    }

    #[test]
    fn test_write_outputs_creates_directories() {
        let dir = TempDir::new().unwrap();
        let output = PipelineOutput {
            matrix:    vec![row()],
            error_log: ErrorLog::new(),
            summary:   RunSummary {
                generated_at:       chrono::Utc::now(),
                input_records:      1,
                normalized_records: 1,
                built_rows:         1,
                dropped_records:    0,
                supplied_rows:      0,
                matrix_rows:        1,
                rejected:           Default::default(),
                exported_rejects:   0,
            },
        };

        let matrix_path = dir.path().join("out").join("trace_matrix.csv");
        let error_path = dir.path().join("out").join("trace_errors.csv");
        write_outputs(&output, &matrix_path, &error_path, OutputFormat::Csv).unwrap();

        let matrix = std::fs::read_to_string(&matrix_path).unwrap();
        assert_eq!(matrix.lines().count(), 2);
        assert_eq!(std::fs::read_to_string(&error_path).unwrap().lines().count(), 1);

        let summary: RunSummary =
            serde_json::from_str(&summary_to_json(&output.summary).unwrap()).unwrap();
        assert_eq!(summary, output.summary);
    }

    #[test]
    fn test_failed_error_log_leaves_no_matrix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let output = PipelineOutput {
            matrix:    vec![row()],
            error_log: ErrorLog::new(),
            summary:   RunSummary {
                generated_at:       chrono::Utc::now(),
                input_records:      1,
                normalized_records: 1,
                built_rows:         1,
                dropped_records:    0,
                supplied_rows:      0,
                matrix_rows:        1,
                rejected:           Default::default(),
                exported_rejects:   0,
            },
        };

        let out = dir.path().join("out");
        let matrix_path = out.join("trace_matrix.csv");
        let error_path = dir.path().join("blocker").join("trace_errors.csv");
        let result = write_outputs(&output, &matrix_path, &error_path, OutputFormat::Csv);

        assert!(matches!(result, Err(TraceError::Export(_))));
        assert!(!matrix_path.exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_write_outputs_replaces_previous_run() {
        let dir = TempDir::new().unwrap();
        let matrix_path = dir.path().join("trace_matrix.csv");
        let error_path = dir.path().join("trace_errors.csv");
        std::fs::write(&matrix_path, "stale\n").unwrap();

        let output = PipelineOutput {
            matrix:    Vec::new(),
            error_log: ErrorLog::new(),
            summary:   RunSummary {
                generated_at:       chrono::Utc::now(),
                input_records:      0,
                normalized_records: 0,
                built_rows:         0,
                dropped_records:    0,
                supplied_rows:      0,
                matrix_rows:        0,
                rejected:           Default::default(),
                exported_rejects:   0,
            },
        };
        write_outputs(&output, &matrix_path, &error_path, OutputFormat::Csv).unwrap();

        assert!(std::fs::read_to_string(&matrix_path).unwrap().starts_with("PRD,SRS ID,"));
        assert!(!staging_path(&matrix_path).exists());
        assert!(!staging_path(&error_path).exists());
    }
}
