//! Trace matrix construction
//!
//! Fans each normalized record out into one [`TraceRow`] per SRS reference
//! its test name carries. Records without a name, or whose name does not
//! start with an accepted domain prefix, are rejected. Records that pass
//! both gates but carry no SRS reference produce no row and no reject; they
//! are only counted.

use tracing::debug;

use crate::{
    config::{
        DomainPrefixes,
        TraceConfig,
    },
    error::TraceResult,
    extract::{
        unique_refs,
        ExtractionMode,
        RefExtractor,
    },
    trace::{
        RejectReason,
        RejectedRow,
        TestMethod,
        TestRecord,
        TraceRow,
    },
};

/// Rows and rejects produced from a sequence of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    /// Trace rows in record order, then extraction order
    pub rows:    Vec<TraceRow>,
    /// Rejected records in record order
    pub rejects: Vec<RejectedRow>,
    /// Records accepted by prefix that yielded no SRS reference
    pub dropped: usize,
}

/// Builds trace rows from normalized records
#[derive(Debug, Clone)]
pub struct TraceMatrixBuilder {
    domain_prefixes: DomainPrefixes,
    manual_refs:     RefExtractor,
    automatic_refs:  RefExtractor,
}

impl TraceMatrixBuilder {
    /// Create a builder for `srs_prefix`
    ///
    /// Manual test names are split into whitespace tokens; automated test
    /// names are searched for `srs_prefix` followed by digits.
    pub fn new(srs_prefix: &str, domain_prefixes: DomainPrefixes) -> TraceResult<Self> {
        Ok(Self {
            domain_prefixes,
            manual_refs: RefExtractor::new(srs_prefix, ExtractionMode::Tokens)?,
            automatic_refs: RefExtractor::new(srs_prefix, ExtractionMode::Pattern)?,
        })
    }

    /// Create a builder from run configuration
    pub fn from_config(config: &TraceConfig) -> TraceResult<Self> {
        Self::new(&config.srs_prefix, config.domain_prefixes.clone())
    }

    /// Distinct SRS references of `record`, in order of appearance
    pub fn srs_refs(&self, record: &TestRecord) -> Vec<String> {
        let extractor = match record.method {
            TestMethod::Manual => &self.manual_refs,
            TestMethod::Automatic => &self.automatic_refs,
        };
        unique_refs(extractor.extract(&record.test_name))
    }

    /// Build the trace rows for `records`
    pub fn build(&self, records: &[TestRecord]) -> BuildOutput {
        let mut output = BuildOutput::default();

        for record in records {
            if record.test_name.trim().is_empty() {
                output
                    .rejects
                    .push(RejectedRow::from_record(record, RejectReason::NameNotFound));
                continue;
            }

            if !self.domain_prefixes.accepts(record.method, &record.test_name) {
                output
                    .rejects
                    .push(RejectedRow::from_record(record, RejectReason::NotPartOfTrace));
                continue;
            }

            let refs = self.srs_refs(record);
            if refs.is_empty() {
                debug!(test_name = %record.test_name, "no SRS reference, dropping test");
                output.dropped += 1;
                continue;
            }

            output
                .rows
                .extend(refs.into_iter().map(|srs_id| TraceRow::from_record(record, srs_id)));
        }

        output
    }
}

/// Build trace rows with the default domain prefixes
pub fn build(records: &[TestRecord], srs_prefix: &str) -> TraceResult<BuildOutput> {
    Ok(TraceMatrixBuilder::new(srs_prefix, DomainPrefixes::default())?.build(records))
}
