//! End-to-end trace matrix run
//!
//! Normalize every batch, build rows, append the rows of an existing trace
//! matrix when one is supplied, resolve PRDs from links when a link list is
//! given, validate, then aggregate every reject into the error log.

use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::info;

use crate::{
    aggregate::{
        aggregate,
        ErrorLog,
    },
    builder::TraceMatrixBuilder,
    config::TraceConfig,
    coverage::{
        trace_coverage,
        TraceCoverage,
    },
    error::TraceResult,
    hierarchy::RequirementLinks,
    records::{
        normalize_all,
        RecordBatch,
    },
    trace::{
        RejectReason,
        TraceRow,
    },
    validate::{
        ReferenceLists,
        Validator,
    },
};

/// Counts describing one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run finished
    pub generated_at:       DateTime<Utc>,
    /// Raw records across all batches
    pub input_records:      usize,
    /// Records with a pass/fail status
    pub normalized_records: usize,
    /// Rows produced by the builder
    pub built_rows:         usize,
    /// Records accepted by prefix that carried no SRS reference
    pub dropped_records:    usize,
    /// Rows taken from an existing trace matrix
    #[serde(default)]
    pub supplied_rows:      usize,
    /// Rows in the final matrix
    pub matrix_rows:        usize,
    /// Rejects per reason, whether or not they were exported
    pub rejected:           BTreeMap<RejectReason, usize>,
    /// Rows written to the error log
    pub exported_rejects:   usize,
}

impl RunSummary {
    /// Total rejects across every stage
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Rows that passed every check
    pub matrix:    Vec<TraceRow>,
    /// Rejects in stage order
    pub error_log: ErrorLog,
    /// Run counts
    pub summary:   RunSummary,
}

/// A configured trace matrix run
#[derive(Debug, Clone)]
pub struct TracePipeline {
    config:     TraceConfig,
    builder:    TraceMatrixBuilder,
    validator:  Validator,
    links:      Option<RequirementLinks>,
    trace_rows: Vec<TraceRow>,
}

impl TracePipeline {
    /// Create a pipeline, validating `config`
    pub fn new(config: TraceConfig, references: ReferenceLists) -> TraceResult<Self> {
        config.validate()?;
        let builder = TraceMatrixBuilder::from_config(&config)?;
        let validator = Validator::from_config(&config, references);

        Ok(Self {
            config,
            builder,
            validator,
            links: None,
            trace_rows: Vec::new(),
        })
    }

    /// Fill PRD cells from `links` before validation
    pub fn with_links(mut self, links: RequirementLinks) -> Self {
        self.links = Some(links);
        self
    }

    /// Validate `rows` of an existing trace matrix along with the built rows
    ///
    /// Supplied rows follow the built rows and go through link resolution,
    /// which only fills their empty PRD cells. Running over no batches
    /// validates the supplied rows alone.
    pub fn with_trace_rows(mut self, rows: Vec<TraceRow>) -> Self {
        self.trace_rows = rows;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Run every stage over `batches`
    pub fn run(&self, batches: &[RecordBatch]) -> PipelineOutput {
        let input_records: usize = batches.iter().map(|batch| batch.records.len()).sum();

        let normalized = normalize_all(batches);
        info!(
            batches = batches.len(),
            input = input_records,
            records = normalized.records.len(),
            invalid = normalized.rejects.len(),
            "normalized test records"
        );

        let built = self.builder.build(&normalized.records);
        info!(
            rows = built.rows.len(),
            rejected = built.rejects.len(),
            dropped = built.dropped,
            "built trace rows"
        );
        let built_rows = built.rows.len();

        let mut rows = built.rows;
        if !self.trace_rows.is_empty() {
            info!(rows = self.trace_rows.len(), "appended existing trace matrix rows");
            rows.extend(self.trace_rows.iter().cloned());
        }

        let rows = match &self.links {
            Some(links) => {
                let rows = links.resolve(rows);
                info!(
                    links = links.len(),
                    resolved = rows.iter().filter(|row| row.prd.is_some()).count(),
                    "resolved requirement links"
                );
                rows
            },
            None => rows,
        };

        let (matrix, stage_rejects) = self.validator.validate(rows).into_parts();
        let validated = aggregate(stage_rejects);

        let mut filtered = ErrorLog::new();
        filtered.push_batch(normalized.rejects);
        filtered.push_batch(built.rejects);

        let mut rejected = filtered.reason_counts();
        for (reason, count) in validated.reason_counts() {
            *rejected.entry(reason).or_insert(0) += count;
        }

        let error_log = if self.config.include_filtered {
            filtered.push_batch(validated.into_rows());
            filtered
        } else {
            validated
        };

        let summary = RunSummary {
            generated_at: Utc::now(),
            input_records,
            normalized_records: normalized.records.len(),
            built_rows,
            dropped_records: built.dropped,
            supplied_rows: self.trace_rows.len(),
            matrix_rows: matrix.len(),
            rejected,
            exported_rejects: error_log.len(),
        };
        info!(
            matrix = summary.matrix_rows,
            rejected = summary.total_rejected(),
            exported = summary.exported_rejects,
            "trace matrix run finished"
        );

        PipelineOutput {
            matrix,
            error_log,
            summary,
        }
    }

    /// Audit which tests in `matrix` are traced to every requirement they
    /// name
    pub fn coverage(&self, matrix: &[TraceRow]) -> TraceCoverage {
        trace_coverage(matrix, &self.config.prd_prefix, &self.config.srs_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        records::{
            RawTestRecord,
            SourceKind,
        },
        trace::{
            TestMethod,
            TestRecord,
            TestStatus,
        },
    };

    fn raw(test_name: &str, status: &str) -> RawTestRecord {
        RawTestRecord {
            test_name: test_name.to_string(),
            status: status.to_string(),
            ..RawTestRecord::default()
        }
    }

    fn references() -> ReferenceLists {
        ReferenceLists::new(["US10", "US11"], ["TC999"])
    }

    fn links() -> RequirementLinks {
        [("US10", "TC1"), ("US11", "TC2"), ("US10", "TC999")]
            .into_iter()
            .collect()
    }

    fn batches() -> Vec<RecordBatch> {
        vec![
            RecordBatch::new(SourceKind::Manual)
                .with_report_id("0012345 v02")
                .with_record(raw("SRS TC1 login US10", "Passed"))
                .with_record(raw("SRS TC999 legacy test", "Passed"))
                .with_record(raw("PRD TC2 logout", "Blocked"))
                .with_record(raw("notes", "Passed")),
            RecordBatch::new(SourceKind::RestApi)
                .with_record(raw("TC2 logout works", "passed"))
                .with_record(raw("TC smoke", "failed")),
        ]
    }

    #[test]
    fn test_run_with_links() {
        let pipeline = TracePipeline::new(TraceConfig::default(), references())
            .unwrap()
            .with_links(links());
        let output = pipeline.run(&batches());

        let matrix: Vec<_> = output
            .matrix
            .iter()
            .map(|row| (row.srs_id.as_str(), row.prd.as_deref()))
            .collect();
        assert_eq!(matrix, vec![("TC1", Some("US10")), ("TC2", Some("US11"))]);
        assert_eq!(output.matrix[0].report_id, "0012345 v02");

        let reasons: Vec<_> = output.error_log.rows().iter().map(|r| r.error_reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::InvalidStatus,
                RejectReason::NotPartOfTrace,
                RejectReason::ObsoleteSrs,
            ]
        );

        let summary = &output.summary;
        assert_eq!(summary.input_records, 6);
        assert_eq!(summary.normalized_records, 5);
        assert_eq!(summary.built_rows, 3);
        assert_eq!(summary.dropped_records, 1);
        assert_eq!(summary.matrix_rows, 2);
        assert_eq!(summary.total_rejected(), 3);
        assert_eq!(summary.exported_rejects, 3);
    }

    #[test]
    fn test_without_links_rows_lack_prd() {
        let pipeline = TracePipeline::new(TraceConfig::default(), references()).unwrap();
        let output = pipeline.run(&batches());

        assert!(output.matrix.is_empty());
        assert_eq!(
            output.summary.rejected.get(&RejectReason::SrsWithoutPrd),
            Some(&3)
        );
    }

    #[test]
    fn test_no_filtered_keeps_only_validator_rejects() {
        let config = TraceConfig {
            include_filtered: false,
            ..TraceConfig::default()
        };
        let pipeline = TracePipeline::new(config, references()).unwrap().with_links(links());
        let output = pipeline.run(&batches());

        assert_eq!(output.error_log.len(), 1);
        assert_eq!(output.error_log.rows()[0].error_reason, RejectReason::ObsoleteSrs);
        assert_eq!(output.summary.total_rejected(), 3);
        assert_eq!(output.summary.exported_rejects, 1);
    }

    #[test]
    fn test_empty_run() {
        let pipeline = TracePipeline::new(TraceConfig::default(), ReferenceLists::default()).unwrap();
        let output = pipeline.run(&[]);
        assert!(output.matrix.is_empty());
        assert!(output.error_log.is_empty());
        assert_eq!(output.summary.input_records, 0);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = TraceConfig {
            srs_prefix: String::new(),
            ..TraceConfig::default()
        };
        assert!(TracePipeline::new(config, references()).is_err());
    }

    fn trace_rows() -> Vec<TraceRow> {
        let record = |name: &str| TestRecord::new(name, TestStatus::Passed, TestMethod::Manual);
        vec![
            TraceRow::from_record(&record("SRS TC1 login US10"), "TC1").with_prd("US10"),
            TraceRow::from_record(&record(""), "N/A").with_prd("US12"),
            TraceRow::from_record(&record("TC5"), "TC5").with_prd("US10"),
            TraceRow::from_record(&record("SRS TC2 logout"), "TC2"),
        ]
    }

    #[test]
    fn test_supplied_rows_alone() {
        let pipeline = TracePipeline::new(TraceConfig::default(), references())
            .unwrap()
            .with_links(links())
            .with_trace_rows(trace_rows());
        let output = pipeline.run(&[]);

        let matrix: Vec<_> = output
            .matrix
            .iter()
            .map(|row| (row.srs_id.as_str(), row.prd.as_deref()))
            .collect();
        assert_eq!(matrix, vec![("TC1", Some("US10")), ("TC2", Some("US11"))]);

        let reasons: Vec<_> = output.error_log.rows().iter().map(|r| r.error_reason).collect();
        assert_eq!(
            reasons,
            vec![RejectReason::PrdWithoutSrs, RejectReason::SrsWithoutTest]
        );
        assert_eq!(output.summary.supplied_rows, 4);
        assert_eq!(output.summary.built_rows, 0);
    }

    #[test]
    fn test_supplied_rows_follow_built_rows() {
        let pipeline = TracePipeline::new(TraceConfig::default(), references())
            .unwrap()
            .with_links(links())
            .with_trace_rows(trace_rows());
        let output = pipeline.run(&batches());

        let test_names: Vec<_> = output.matrix.iter().map(|row| row.test_name.as_str()).collect();
        assert_eq!(
            test_names,
            vec!["SRS TC1 login US10", "TC2 logout works", "SRS TC1 login US10", "SRS TC2 logout"]
        );
        assert_eq!(output.summary.built_rows, 3);
        assert_eq!(output.summary.matrix_rows, 4);
    }

    #[test]
    fn test_coverage_of_run() {
        let pipeline = TracePipeline::new(TraceConfig::default(), references())
            .unwrap()
            .with_links(links());
        let output = pipeline.run(&batches());
        let coverage = pipeline.coverage(&output.matrix);
        assert!(coverage.traced.contains("SRS TC1 login US10"));
        assert!(coverage.traced.contains("TC2 logout works"));
    }
}
