//! Record normalization
//!
//! External readers turn as-run reports and automated logs into
//! [`RecordBatch`]es of raw rows. Normalization maps each raw row onto a
//! [`TestRecord`], using the status vocabulary of the row's source, and
//! rejects rows whose status is neither a pass nor a fail.

use std::{
    fmt,
    sync::LazyLock,
};

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::trace::{
    RejectReason,
    RejectedRow,
    TestMethod,
    TestRecord,
    TestStatus,
};

static REPORT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("ER([0-9]+ v[0-9]+|[0-9]+v[0-9]+)").expect("report id pattern is valid")
});

/// Where a batch of raw results came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Manual as-run report
    Manual,
    /// Automated REST API test log
    RestApi,
    /// Automated device/protocol test log
    ProtocolLog,
    /// Automated performance results
    Performance,
    /// Automated component (gateway) results
    Component,
}

impl SourceKind {
    /// Execution method of every record from this source
    pub fn method(&self) -> TestMethod {
        match self {
            SourceKind::Manual => TestMethod::Manual,
            SourceKind::RestApi
            | SourceKind::ProtocolLog
            | SourceKind::Performance
            | SourceKind::Component => TestMethod::Automatic,
        }
    }

    /// Map a raw status onto a [`TestStatus`] using this source's vocabulary
    pub fn parse_status(&self, raw: &str) -> Option<TestStatus> {
        let raw = raw.trim();
        match self {
            SourceKind::Manual => match raw {
                "Passed" => Some(TestStatus::Passed),
                "Failed" => Some(TestStatus::Failed),
                _ => None,
            },
            SourceKind::RestApi => match raw {
                "passed" => Some(TestStatus::Passed),
                "failed" => Some(TestStatus::Failed),
                _ => None,
            },
            SourceKind::ProtocolLog => {
                if raw.eq_ignore_ascii_case("passed") {
                    Some(TestStatus::Passed)
                } else if raw.eq_ignore_ascii_case("failed") {
                    Some(TestStatus::Failed)
                } else {
                    None
                }
            },
            SourceKind::Performance | SourceKind::Component => match raw {
                "PASS" => Some(TestStatus::Passed),
                "FAIL" => Some(TestStatus::Failed),
                _ => None,
            },
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Manual => write!(f, "manual"),
            SourceKind::RestApi => write!(f, "rest_api"),
            SourceKind::ProtocolLog => write!(f, "protocol_log"),
            SourceKind::Performance => write!(f, "performance"),
            SourceKind::Component => write!(f, "component"),
        }
    }
}

/// One row as produced by an external reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTestRecord {
    /// Test identifier
    pub test_name:   String,
    /// Status in the source's own vocabulary
    pub status:      String,
    /// Release under test
    pub release:     String,
    /// Test owner
    pub owner:       String,
    /// Application under test
    pub application: String,
    /// V&V report id; falls back to the batch report id when empty
    pub report_id:   String,
}

/// Raw rows from one source document or log folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    /// Source the rows came from
    pub source:    SourceKind,
    /// Report id shared by every row of the batch
    #[serde(default)]
    pub report_id: Option<String>,
    /// Raw rows
    #[serde(default)]
    pub records:   Vec<RawTestRecord>,
}

impl RecordBatch {
    /// Create an empty batch
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            report_id: None,
            records: Vec::new(),
        }
    }

    /// Set the batch report id
    pub fn with_report_id(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }

    /// Append a raw row
    pub fn with_record(mut self, record: RawTestRecord) -> Self {
        self.records.push(record);
        self
    }
}

/// Result of normalizing one or more batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Records with a pass/fail status
    pub records: Vec<TestRecord>,
    /// Rows rejected for their status
    pub rejects: Vec<RejectedRow>,
}

impl Normalized {
    /// Append another normalization result, keeping order
    pub fn extend(&mut self, other: Normalized) {
        self.records.extend(other.records);
        self.rejects.extend(other.rejects);
    }
}

/// Normalize every row of `batch`
pub fn normalize(batch: &RecordBatch) -> Normalized {
    let method = batch.source.method();
    let batch_report_id = batch.report_id.as_deref().unwrap_or_default();
    let mut normalized = Normalized::default();

    for raw in &batch.records {
        let report_id = if raw.report_id.trim().is_empty() {
            batch_report_id.to_string()
        } else {
            raw.report_id.clone()
        };

        match batch.source.parse_status(&raw.status) {
            Some(status) => normalized.records.push(TestRecord {
                test_name: raw.test_name.clone(),
                status,
                method,
                report_id,
                release: raw.release.clone(),
                owner: raw.owner.clone(),
                application: raw.application.clone(),
            }),
            None => normalized.rejects.push(RejectedRow {
                error_reason: RejectReason::InvalidStatus,
                prd:          None,
                srs_id:       None,
                test_name:    raw.test_name.clone(),
                status:       raw.status.clone(),
                method,
                report_id,
                release:      raw.release.clone(),
                owner:        raw.owner.clone(),
                application:  raw.application.clone(),
            }),
        }
    }

    normalized
}

/// Normalize several batches in order
pub fn normalize_all<'a>(batches: impl IntoIterator<Item = &'a RecordBatch>) -> Normalized {
    let mut normalized = Normalized::default();
    for batch in batches {
        normalized.extend(normalize(batch));
    }
    normalized
}

/// Extract the V&V report id (`ER0012345 v02` -> `0012345 v02`) from a file
/// name
pub fn report_id_from_file_name(file_name: &str) -> Option<String> {
    REPORT_ID_PATTERN
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
