//! Loading of external inputs
//!
//! Every loader here is all-or-nothing: an input that cannot be parsed is a
//! fatal [`TraceError`], so a run never works from a partial snapshot.

use std::{
    collections::HashSet,
    path::{
        Path,
        PathBuf,
    },
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{
    delimited::split_record,
    error::{
        TraceError,
        TraceResult,
    },
    hierarchy::RequirementLinks,
    records::{
        report_id_from_file_name,
        RecordBatch,
    },
    trace::{
        TestMethod,
        TestStatus,
        TraceRow,
    },
};

/// Header names accepted for the id column of a reference list, in order of
/// preference
pub const ID_COLUMNS: [&str; 3] = ["ID", "Formatted ID", "id"];

/// Header names accepted for the PRD column of a link list
pub const PRD_COLUMNS: [&str; 2] = ["PRD", "PRD ID"];

/// Header names accepted for the SRS column of a link list or trace matrix
pub const SRS_COLUMNS: [&str; 2] = ["SRS ID", "SRS"];

const BYTE_ORDER_MARK: char = '\u{feff}';

fn read_input(path: &Path, what: &str) -> TraceResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| TraceError::Input(format!("Failed to read {} {}: {}", what, path.display(), e)))
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content)
}

/// Split delimited text into its header record and the remaining non-blank
/// lines
fn header_and_lines<'c>(
    content: &'c str,
    source: &str,
) -> TraceResult<(Vec<String>, impl Iterator<Item = &'c str>)> {
    let mut lines = strip_bom(content).lines().filter(|line| !line.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Err(TraceError::Input(format!("{} is empty", source)));
    };
    Ok((split_record(header_line), lines))
}

/// Load one record batch from a JSON file
///
/// A batch without a report id takes it from its file name when the name
/// carries one.
pub fn load_record_batch(path: &Path) -> TraceResult<RecordBatch> {
    let content = read_input(path, "record batch")?;
    let mut batch: RecordBatch = serde_json::from_str(strip_bom(&content)).map_err(|e| {
        TraceError::Input(format!(
            "Failed to parse record batch {}: {}",
            path.display(),
            e
        ))
    })?;

    if batch.report_id.is_none() {
        batch.report_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(report_id_from_file_name);
    }

    debug!(
        path = %path.display(),
        source = %batch.source,
        records = batch.records.len(),
        "loaded record batch"
    );
    Ok(batch)
}

/// Resolve a file or directory argument into batch files
///
/// Directories are walked recursively for `*.json` files, returned in path
/// order.
pub fn discover_batch_files(path: &Path) -> TraceResult<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(TraceError::Input(format!(
            "Record source {} does not exist",
            path.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| {
            TraceError::Input(format!("Failed to walk {}: {}", path.display(), e))
        })?;
        if entry.file_type().is_file() &&
            entry.path().extension().is_some_and(|ext| ext == "json")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();

    Ok(files)
}

/// Load every batch under `paths`
///
/// When `method` is given, every batch must come from a source of that
/// method; a manual batch passed as automated input (or the reverse) is an
/// identity error.
pub fn load_batches(paths: &[PathBuf], method: Option<TestMethod>) -> TraceResult<Vec<RecordBatch>> {
    let mut batches = Vec::new();
    for path in paths {
        for file in discover_batch_files(path)? {
            let batch = load_record_batch(&file)?;
            if let Some(expected) = method {
                if batch.source.method() != expected {
                    return Err(TraceError::Identity(format!(
                        "{} holds {} results but was given as {} input",
                        file.display(),
                        batch.source,
                        expected
                    )));
                }
            }
            batches.push(batch);
        }
    }
    Ok(batches)
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| header.iter().position(|cell| cell.trim() == *name))
}

/// Parse a reference id list from delimited text
///
/// The id column is the first of [`ID_COLUMNS`] found in the header. A
/// single-column file without such a header is read as one id per line.
pub fn parse_id_list(content: &str, source: &str) -> TraceResult<HashSet<String>> {
    let (header, lines) = header_and_lines(content, source)?;

    let (column, mut ids) = match find_column(&header, &ID_COLUMNS) {
        Some(column) => (column, HashSet::new()),
        None if header.len() == 1 => {
            (0, HashSet::from([header[0].trim().to_string()]))
        },
        None => {
            return Err(TraceError::Input(format!(
                "{} has no id column (expected one of {:?})",
                source, ID_COLUMNS
            )));
        },
    };

    for line in lines {
        let fields = split_record(line);
        if let Some(id) = fields.get(column).map(|field| field.trim()) {
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }
    }

    Ok(ids)
}

/// Load a reference id list from a file
pub fn load_id_list(path: &Path) -> TraceResult<HashSet<String>> {
    let content = read_input(path, "id list")?;
    let ids = parse_id_list(&content, &path.display().to_string())?;
    debug!(path = %path.display(), ids = ids.len(), "loaded id list");
    Ok(ids)
}

/// Parse PRD → SRS links from delimited text with `PRD` and `SRS ID`
/// columns
pub fn parse_links(content: &str, source: &str) -> TraceResult<RequirementLinks> {
    let (header, lines) = header_and_lines(content, source)?;

    let prd_column = find_column(&header, &PRD_COLUMNS).ok_or_else(|| {
        TraceError::Input(format!("{} has no PRD column", source))
    })?;
    let srs_column = find_column(&header, &SRS_COLUMNS).ok_or_else(|| {
        TraceError::Input(format!("{} has no SRS ID column", source))
    })?;

    let mut links = RequirementLinks::new();
    for line in lines {
        let fields = split_record(line);
        let prd = fields.get(prd_column).map(|f| f.trim()).unwrap_or_default();
        let srs = fields.get(srs_column).map(|f| f.trim()).unwrap_or_default();
        if !prd.is_empty() && !srs.is_empty() {
            links.add(prd, srs);
        }
    }

    Ok(links)
}

/// Load PRD → SRS links from a file
pub fn load_links(path: &Path) -> TraceResult<RequirementLinks> {
    let content = read_input(path, "link list")?;
    parse_links(&content, &path.display().to_string())
}

/// Column positions of a trace matrix file
struct MatrixColumns {
    prd:         Option<usize>,
    srs_id:      usize,
    test_name:   usize,
    status:      Option<usize>,
    release:     Option<usize>,
    owner:       Option<usize>,
    application: Option<usize>,
    method:      Option<usize>,
    report_id:   Option<usize>,
}

impl MatrixColumns {
    fn from_header(header: &[String], source: &str) -> TraceResult<Self> {
        let required = |names: &[&str], what: &str| {
            find_column(header, names)
                .ok_or_else(|| TraceError::Input(format!("{} has no {} column", source, what)))
        };

        Ok(Self {
            prd:         find_column(header, &PRD_COLUMNS),
            srs_id:      required(&SRS_COLUMNS, "SRS ID")?,
            test_name:   required(&["Test Name"], "Test Name")?,
            status:      find_column(header, &["Test Status", "Status"]),
            release:     find_column(header, &["Release"]),
            owner:       find_column(header, &["Owner"]),
            application: find_column(header, &["Application"]),
            method:      find_column(header, &["Method"]),
            report_id:   find_column(header, &["V&V Test Report"]),
        })
    }
}

fn parse_status(cell: &str) -> Option<TestStatus> {
    match cell.to_ascii_lowercase().as_str() {
        "" | "failed" | "fail" => Some(TestStatus::Failed),
        "passed" | "pass" => Some(TestStatus::Passed),
        _ => None,
    }
}

fn parse_method(cell: &str) -> Option<TestMethod> {
    match cell.to_ascii_lowercase().as_str() {
        "" | "manual" => Some(TestMethod::Manual),
        "automatic" | "automated" => Some(TestMethod::Automatic),
        _ => None,
    }
}

/// Parse an existing trace matrix from delimited text
///
/// `SRS ID` and `Test Name` columns are required; every other column of
/// [`MATRIX_HEADERS`](crate::export::MATRIX_HEADERS) is optional. Blank
/// cells read as empty text, except that a blank PRD is no PRD, a blank
/// status is `Failed` and a blank method is `Manual`. A status or method
/// outside those vocabularies is an input error.
pub fn parse_trace_matrix(content: &str, source: &str) -> TraceResult<Vec<TraceRow>> {
    let (header, lines) = header_and_lines(content, source)?;
    let columns = MatrixColumns::from_header(&header, source)?;

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let fields = split_record(line);
        let cell = |column: Option<usize>| {
            column
                .and_then(|column| fields.get(column))
                .map(|field| field.trim().to_string())
                .unwrap_or_default()
        };

        let status = cell(columns.status);
        let status = parse_status(&status).ok_or_else(|| {
            TraceError::Input(format!(
                "{} data row {}: invalid test status '{}'",
                source,
                index + 1,
                status
            ))
        })?;
        let method = cell(columns.method);
        let method = parse_method(&method).ok_or_else(|| {
            TraceError::Input(format!(
                "{} data row {}: invalid method '{}'",
                source,
                index + 1,
                method
            ))
        })?;

        let prd = cell(columns.prd);
        rows.push(TraceRow {
            prd: (!prd.is_empty()).then_some(prd),
            srs_id: cell(Some(columns.srs_id)),
            test_name: cell(Some(columns.test_name)),
            status,
            method,
            report_id: cell(columns.report_id),
            release: cell(columns.release),
            owner: cell(columns.owner),
            application: cell(columns.application),
        });
    }

    Ok(rows)
}

/// Load an existing trace matrix from a file
pub fn load_trace_matrix(path: &Path) -> TraceResult<Vec<TraceRow>> {
    let content = read_input(path, "trace matrix")?;
    let rows = parse_trace_matrix(&content, &path.display().to_string())?;
    debug!(path = %path.display(), rows = rows.len(), "loaded trace matrix");
    Ok(rows)
}
