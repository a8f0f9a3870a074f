//! Test-to-requirement trace coverage audit
//!
//! A test name claims requirements by naming them. The audit checks, for
//! every test in the matrix, that each SRS it names has a row for that test
//! and each PRD it names appears in the `prd` cell of one of its rows. It
//! reports; it never removes rows.

use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
    HashSet,
};

use serde::Serialize;

use crate::{
    extract::{
        extract_delimited_refs,
        extract_refs,
        unique_refs,
    },
    trace::TraceRow,
};

/// Traced and untraced tests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceCoverage {
    /// Tests whose every named requirement is traced
    pub traced:   BTreeSet<String>,
    /// Tests with at least one named requirement missing from the matrix,
    /// with the missing references
    pub untraced: BTreeMap<String, Vec<String>>,
}

impl TraceCoverage {
    /// Share of audited tests that are fully traced, in percent
    pub fn traced_percentage(&self) -> f64 {
        let total = self.traced.len() + self.untraced.len();
        if total == 0 {
            return 100.0;
        }
        (self.traced.len() as f64 / total as f64) * 100.0
    }
}

#[derive(Default)]
struct TracedRefs<'a> {
    srs: HashSet<&'a str>,
    prd: HashSet<String>,
}

/// Audit `rows`. Tests that name no requirement are not audited.
pub fn trace_coverage(rows: &[TraceRow], prd_prefix: &str, srs_prefix: &str) -> TraceCoverage {
    let mut by_test: HashMap<&str, TracedRefs<'_>> = HashMap::new();
    for row in rows {
        let traced = by_test.entry(row.test_name.as_str()).or_default();
        traced.srs.insert(row.srs_id.as_str());
        if let Some(prd) = &row.prd {
            traced.prd.extend(extract_delimited_refs(prd, prd_prefix));
        }
    }

    let mut coverage = TraceCoverage::default();
    for (test_name, traced) in &by_test {
        let srs_refs = extract_refs(test_name, srs_prefix);
        let prd_refs = extract_refs(test_name, prd_prefix);
        if srs_refs.is_empty() && prd_refs.is_empty() {
            continue;
        }

        let mut missing: Vec<String> = srs_refs
            .into_iter()
            .filter(|srs| !traced.srs.contains(srs.as_str()))
            .collect();
        missing.extend(prd_refs.into_iter().filter(|prd| !traced.prd.contains(prd)));
        let missing = unique_refs(missing);

        if missing.is_empty() {
            coverage.traced.insert(test_name.to_string());
        } else {
            coverage.untraced.insert(test_name.to_string(), missing);
        }
    }

    coverage
}
