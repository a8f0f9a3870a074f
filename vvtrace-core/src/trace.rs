//! Trace matrix data model
//!
//! A [`TestRecord`] is one normalized test execution. The builder fans each
//! record out into [`TraceRow`]s, one per SRS reference, and every record or
//! row that drops out of the matrix becomes a [`RejectedRow`] carrying a
//! [`RejectReason`].

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Outcome of a test execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "Passed"),
            TestStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// How a test was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMethod {
    /// Executed by hand and recorded in an as-run report
    Manual,
    /// Executed by an automated harness
    Automatic,
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMethod::Manual => write!(f, "Manual"),
            TestMethod::Automatic => write!(f, "Automatic"),
        }
    }
}

/// A normalized test execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Raw test identifier, expected to embed requirement tokens
    pub test_name:   String,
    /// Execution outcome
    pub status:      TestStatus,
    /// Execution method
    pub method:      TestMethod,
    /// V&V test report the result was recorded in
    pub report_id:   String,
    /// Release under test
    pub release:     String,
    /// Test owner
    pub owner:       String,
    /// Application under test
    pub application: String,
}

impl TestRecord {
    /// Create a record with empty provenance metadata
    pub fn new(test_name: impl Into<String>, status: TestStatus, method: TestMethod) -> Self {
        Self {
            test_name: test_name.into(),
            status,
            method,
            report_id: String::new(),
            release: String::new(),
            owner: String::new(),
            application: String::new(),
        }
    }

    /// Set the report id
    pub fn with_report_id(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = report_id.into();
        self
    }

    /// Set the release
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    /// Set the owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the application
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }
}

/// One row of the trace matrix: a single SRS reference of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Product requirement(s) the SRS traces to, if resolved
    pub prd:         Option<String>,
    /// The single SRS reference this row stands for
    pub srs_id:      String,
    /// Raw test identifier
    pub test_name:   String,
    /// Execution outcome
    pub status:      TestStatus,
    /// Execution method
    pub method:      TestMethod,
    /// V&V test report
    pub report_id:   String,
    /// Release under test
    pub release:     String,
    /// Test owner
    pub owner:       String,
    /// Application under test
    pub application: String,
}

impl TraceRow {
    /// Create a row for `srs_id` carrying all of `record`'s metadata
    pub fn from_record(record: &TestRecord, srs_id: impl Into<String>) -> Self {
        Self {
            prd:         None,
            srs_id:      srs_id.into(),
            test_name:   record.test_name.clone(),
            status:      record.status,
            method:      record.method,
            report_id:   record.report_id.clone(),
            release:     record.release.clone(),
            owner:       record.owner.clone(),
            application: record.application.clone(),
        }
    }

    /// Set the PRD cell
    pub fn with_prd(mut self, prd: impl Into<String>) -> Self {
        self.prd = Some(prd.into());
        self
    }

    /// The PRD cell, or `None` when it does not start with `prd_prefix`
    pub fn recognized_prd(&self, prd_prefix: &str) -> Option<&str> {
        self.prd.as_deref().filter(|prd| prd.starts_with(prd_prefix))
    }

    /// Whether the SRS cell starts with `srs_prefix`
    pub fn has_recognized_srs(&self, srs_prefix: &str) -> bool {
        !self.srs_id.is_empty() && self.srs_id.starts_with(srs_prefix)
    }
}

/// Why a record or row was dropped from the trace matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Raw status outside the source's pass/fail vocabulary
    InvalidStatus,
    /// Empty test name
    NameNotFound,
    /// Test name does not start with an accepted domain prefix
    NotPartOfTrace,
    /// PRD group without any SRS
    PrdWithoutSrs,
    /// SRS group without any real test
    SrsWithoutTest,
    /// SRS group without any PRD
    SrsWithoutPrd,
    /// None of the PRDs an SRS traces to is active
    PrdReferencedBySrsMissing,
    /// Test names an obsolete SRS
    ObsoleteSrs,
    /// Test names a PRD that is not active
    PrdReferencedByTestMissing,
}

impl RejectReason {
    /// Every reason, in pipeline order
    pub const ALL: [RejectReason; 9] = [
        RejectReason::InvalidStatus,
        RejectReason::NameNotFound,
        RejectReason::NotPartOfTrace,
        RejectReason::PrdWithoutSrs,
        RejectReason::SrsWithoutTest,
        RejectReason::SrsWithoutPrd,
        RejectReason::PrdReferencedBySrsMissing,
        RejectReason::ObsoleteSrs,
        RejectReason::PrdReferencedByTestMissing,
    ];

    /// The text written to the `Error` column
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidStatus => "Invalid test status",
            RejectReason::NameNotFound => "Name not found",
            RejectReason::NotPartOfTrace => "test not part of trace",
            RejectReason::PrdWithoutSrs => "PRD does not have SRS",
            RejectReason::SrsWithoutTest => "SRS does not have test",
            RejectReason::SrsWithoutPrd => "SRS does not have PRD",
            RejectReason::PrdReferencedBySrsMissing => "PRD referenced by SRS does not exist",
            RejectReason::ObsoleteSrs => "Test references obsolete SRS",
            RejectReason::PrdReferencedByTestMissing => "PRD referenced by test does not exist",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record or row that left the matrix, with the reason it left
///
/// Status is kept as text because records rejected for an invalid status
/// never had a [`TestStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Rejection reason, always the first exported column
    pub error_reason: RejectReason,
    /// PRD cell, if the rejected item was a trace row with one
    pub prd:          Option<String>,
    /// SRS cell, if the rejected item was a trace row
    pub srs_id:       Option<String>,
    /// Raw test identifier
    pub test_name:    String,
    /// Status as recorded by the source
    pub status:       String,
    /// Execution method
    pub method:       TestMethod,
    /// V&V test report
    pub report_id:    String,
    /// Release under test
    pub release:      String,
    /// Test owner
    pub owner:        String,
    /// Application under test
    pub application:  String,
}

impl RejectedRow {
    /// Reject a trace row
    pub fn from_row(row: TraceRow, reason: RejectReason) -> Self {
        Self {
            error_reason: reason,
            prd:          row.prd,
            srs_id:       Some(row.srs_id),
            test_name:    row.test_name,
            status:       row.status.to_string(),
            method:       row.method,
            report_id:    row.report_id,
            release:      row.release,
            owner:        row.owner,
            application:  row.application,
        }
    }

    /// Reject a normalized record before it was fanned out
    pub fn from_record(record: &TestRecord, reason: RejectReason) -> Self {
        Self {
            error_reason: reason,
            prd:          None,
            srs_id:       None,
            test_name:    record.test_name.clone(),
            status:       record.status.to_string(),
            method:       record.method,
            report_id:    record.report_id.clone(),
            release:      record.release.clone(),
            owner:        record.owner.clone(),
            application:  record.application.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TestRecord {
        TestRecord::new("TC104 login works", TestStatus::Passed, TestMethod::Automatic)
            .with_report_id("0012345 v02")
            .with_release("1.33.0")
            .with_owner("qa")
            .with_application("portal")
    }

    #[test]
    fn test_row_copies_record_metadata() {
        let row = TraceRow::from_record(&record(), "TC104");

        assert_eq!(row.srs_id, "TC104");
        assert_eq!(row.prd, None);
        assert_eq!(row.test_name, "TC104 login works");
        assert_eq!(row.status, TestStatus::Passed);
        assert_eq!(row.method, TestMethod::Automatic);
        assert_eq!(row.report_id, "0012345 v02");
        assert_eq!(row.release, "1.33.0");
        assert_eq!(row.owner, "qa");
        assert_eq!(row.application, "portal");
    }

    #[test]
    fn test_recognized_prd_requires_prefix() {
        let row = TraceRow::from_record(&record(), "TC104");
        assert_eq!(row.recognized_prd("US"), None);

        let row = row.with_prd("US10, US11");
        assert_eq!(row.recognized_prd("US"), Some("US10, US11"));
        assert_eq!(row.recognized_prd("PRD"), None);
    }

    #[test]
    fn test_recognized_srs() {
        let row = TraceRow::from_record(&record(), "TC104");
        assert!(row.has_recognized_srs("TC"));
        assert!(!row.has_recognized_srs("ESA-"));

        let empty = TraceRow::from_record(&record(), "");
        assert!(!empty.has_recognized_srs(""));
    }

    #[test]
    fn test_reject_reason_text() {
        assert_eq!(RejectReason::NameNotFound.to_string(), "Name not found");
        assert_eq!(
            RejectReason::ObsoleteSrs.to_string(),
            "Test references obsolete SRS"
        );
        assert_eq!(
            RejectReason::PrdReferencedByTestMissing.as_str(),
            "PRD referenced by test does not exist"
        );
    }

    #[test]
    fn test_rejected_row_from_row_keeps_cells() {
        let row = TraceRow::from_record(&record(), "TC104").with_prd("US10");
        let rejected = RejectedRow::from_row(row, RejectReason::SrsWithoutPrd);

        assert_eq!(rejected.error_reason, RejectReason::SrsWithoutPrd);
        assert_eq!(rejected.prd.as_deref(), Some("US10"));
        assert_eq!(rejected.srs_id.as_deref(), Some("TC104"));
        assert_eq!(rejected.status, "Passed");
    }

    #[test]
    fn test_rejected_row_from_record_has_no_srs() {
        let rejected = RejectedRow::from_record(&record(), RejectReason::NotPartOfTrace);
        assert_eq!(rejected.srs_id, None);
        assert_eq!(rejected.prd, None);
        assert_eq!(rejected.method, TestMethod::Automatic);
    }
}
