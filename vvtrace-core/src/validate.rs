//! Referential validation of the trace matrix
//!
//! Six checks run in a fixed order. Each one splits its input into valid
//! rows, which feed the next check, and invalid rows, which are terminal.
//!
//! The three "has" checks group rows and only ask whether a group holds at
//! least one counterpart. The three "exists" checks look at each row alone,
//! against the active PRD and obsolete SRS lists:
//!
//! | check                       | tokens from | invalid when                 |
//! |-----------------------------|-------------|------------------------------|
//! | PRD referenced by SRS exists| `prd`       | no token is active           |
//! | SRS exists                  | `test_name` | any token is obsolete        |
//! | PRD exists                  | `test_name` | any token is not active      |

use std::{
    collections::HashSet,
    fmt,
};

use tracing::{
    debug,
    info,
};

use crate::{
    config::TraceConfig,
    extract::{
        extract_delimited_refs,
        extract_refs,
    },
    trace::{
        RejectReason,
        RejectedRow,
        TraceRow,
    },
};

/// Externally maintained requirement lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceLists {
    /// PRDs that are currently active
    pub active_prd_ids:   HashSet<String>,
    /// SRS ids that have been retired
    pub obsolete_srs_ids: HashSet<String>,
}

impl ReferenceLists {
    /// Create reference lists from any id collections
    pub fn new<A, O>(active_prd_ids: A, obsolete_srs_ids: O) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            active_prd_ids:   active_prd_ids.into_iter().map(Into::into).collect(),
            obsolete_srs_ids: obsolete_srs_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Prefixes and lists a check runs against
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Prefix of PRD ids
    pub prd_prefix:          &'a str,
    /// Prefix of SRS ids
    pub srs_prefix:          &'a str,
    /// Test names of this many characters or fewer are not real tests
    pub short_test_name_len: usize,
    /// Active and obsolete lists
    pub references:          &'a ReferenceLists,
}

/// Valid and invalid rows produced by one check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Rows that passed, in input order
    pub valid:   Vec<TraceRow>,
    /// Rows that failed, in input order
    pub invalid: Vec<RejectedRow>,
}

impl Partition {
    /// Split `rows` by a per-row verdict, keeping input order
    fn split(rows: Vec<TraceRow>, invalid: &[bool], reason: RejectReason) -> Self {
        let mut partition = Self::default();
        for (row, is_invalid) in rows.into_iter().zip(invalid) {
            if *is_invalid {
                partition.invalid.push(RejectedRow::from_row(row, reason));
            } else {
                partition.valid.push(row);
            }
        }
        partition
    }
}

/// A single referential integrity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// Every PRD group has at least one SRS
    PrdHasSrs,
    /// Every SRS group has at least one real test
    SrsHasTest,
    /// Every SRS group has at least one PRD
    SrsHasPrd,
    /// At least one PRD an SRS traces to is active
    PrdReferencedBySrsExists,
    /// No SRS a test names is obsolete
    SrsExists,
    /// Every PRD a test names is active
    PrdExists,
}

impl Check {
    /// Checks in pipeline order
    pub const PIPELINE: [Check; 6] = [
        Check::PrdHasSrs,
        Check::SrsHasTest,
        Check::SrsHasPrd,
        Check::PrdReferencedBySrsExists,
        Check::SrsExists,
        Check::PrdExists,
    ];

    /// Reason attached to rows this check rejects
    pub fn reason(&self) -> RejectReason {
        match self {
            Check::PrdHasSrs => RejectReason::PrdWithoutSrs,
            Check::SrsHasTest => RejectReason::SrsWithoutTest,
            Check::SrsHasPrd => RejectReason::SrsWithoutPrd,
            Check::PrdReferencedBySrsExists => RejectReason::PrdReferencedBySrsMissing,
            Check::SrsExists => RejectReason::ObsoleteSrs,
            Check::PrdExists => RejectReason::PrdReferencedByTestMissing,
        }
    }

    /// Run the check over `rows`
    pub fn run(&self, rows: Vec<TraceRow>, ctx: &CheckContext<'_>) -> Partition {
        let invalid = match self {
            Check::PrdHasSrs => group_verdicts(
                &rows,
                |row| row.recognized_prd(ctx.prd_prefix),
                |row| row.has_recognized_srs(ctx.srs_prefix),
            ),
            Check::SrsHasTest => group_verdicts(
                &rows,
                |row| srs_key(row, ctx.srs_prefix),
                |row| row.test_name.chars().count() > ctx.short_test_name_len,
            ),
            Check::SrsHasPrd => group_verdicts(
                &rows,
                |row| srs_key(row, ctx.srs_prefix),
                |row| row.recognized_prd(ctx.prd_prefix).is_some(),
            ),
            Check::PrdReferencedBySrsExists => row_verdicts(&rows, |row| {
                let Some(prd) = row.recognized_prd(ctx.prd_prefix) else {
                    return false;
                };
                if !row.has_recognized_srs(ctx.srs_prefix) {
                    return false;
                }
                let prd_list = extract_delimited_refs(prd, ctx.prd_prefix);
                !prd_list.is_empty() &&
                    !prd_list
                        .iter()
                        .any(|prd| ctx.references.active_prd_ids.contains(prd))
            }),
            Check::SrsExists => row_verdicts(&rows, |row| {
                extract_refs(&row.test_name, ctx.srs_prefix)
                    .iter()
                    .any(|srs| ctx.references.obsolete_srs_ids.contains(srs))
            }),
            Check::PrdExists => row_verdicts(&rows, |row| {
                extract_refs(&row.test_name, ctx.prd_prefix)
                    .iter()
                    .any(|prd| !ctx.references.active_prd_ids.contains(prd))
            }),
        };

        Partition::split(rows, &invalid, self.reason())
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::PrdHasSrs => write!(f, "PRD has SRS"),
            Check::SrsHasTest => write!(f, "SRS has test"),
            Check::SrsHasPrd => write!(f, "SRS has PRD"),
            Check::PrdReferencedBySrsExists => write!(f, "PRD referenced by SRS exists"),
            Check::SrsExists => write!(f, "SRS exists"),
            Check::PrdExists => write!(f, "PRD exists"),
        }
    }
}

fn srs_key<'r>(row: &'r TraceRow, srs_prefix: &str) -> Option<&'r str> {
    row.has_recognized_srs(srs_prefix).then_some(row.srs_id.as_str())
}

/// Group rows by `key`; rows without a key pass. A group fails when none of
/// its rows satisfies `counterpart`. Returns one "invalid" flag per row.
fn group_verdicts<'r, K, C>(rows: &'r [TraceRow], key: K, counterpart: C) -> Vec<bool>
where
    K: Fn(&'r TraceRow) -> Option<&'r str>,
    C: Fn(&TraceRow) -> bool,
{
    let keys: Vec<Option<&str>> = rows.iter().map(&key).collect();
    let satisfied: HashSet<&str> = rows
        .iter()
        .zip(&keys)
        .filter_map(|(row, key)| (*key).filter(|_| counterpart(row)))
        .collect();

    keys.into_iter()
        .map(|key| key.is_some_and(|key| !satisfied.contains(key)))
        .collect()
}

/// One "invalid" flag per row from a per-row predicate
fn row_verdicts<F>(rows: &[TraceRow], is_invalid: F) -> Vec<bool>
where
    F: Fn(&TraceRow) -> bool,
{
    rows.iter().map(is_invalid).collect()
}

/// Rejects produced by one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Check that ran
    pub check:   Check,
    /// Rows the check received
    pub input:   usize,
    /// Rows the check rejected
    pub invalid: Vec<RejectedRow>,
}

/// Result of the full validation pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutput {
    /// Rows that passed every check
    pub valid:  Vec<TraceRow>,
    /// Per-stage rejects, in pipeline order
    pub stages: Vec<StageResult>,
}

impl ValidationOutput {
    /// Total number of rejected rows
    pub fn rejected_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.invalid.len()).sum()
    }

    /// Split into valid rows and reject batches in pipeline order
    pub fn into_parts(self) -> (Vec<TraceRow>, Vec<Vec<RejectedRow>>) {
        let batches = self.stages.into_iter().map(|stage| stage.invalid).collect();
        (self.valid, batches)
    }
}

/// Runs the checks in order, threading valid rows through
#[derive(Debug, Clone)]
pub struct Validator {
    prd_prefix:          String,
    srs_prefix:          String,
    short_test_name_len: usize,
    references:          ReferenceLists,
    checks:              Vec<Check>,
}

impl Validator {
    /// Create a validator running the full pipeline
    pub fn new(
        prd_prefix: impl Into<String>,
        srs_prefix: impl Into<String>,
        references: ReferenceLists,
    ) -> Self {
        Self {
            prd_prefix: prd_prefix.into(),
            srs_prefix: srs_prefix.into(),
            short_test_name_len: TraceConfig::default().short_test_name_len,
            references,
            checks: Check::PIPELINE.to_vec(),
        }
    }

    /// Create a validator from run configuration
    pub fn from_config(config: &TraceConfig, references: ReferenceLists) -> Self {
        Self::new(config.prd_prefix.clone(), config.srs_prefix.clone(), references)
            .with_short_test_name_len(config.short_test_name_len)
    }

    /// Override the length at or below which a test name is too short to
    /// count as a real test
    pub fn with_short_test_name_len(mut self, len: usize) -> Self {
        self.short_test_name_len = len;
        self
    }

    /// Run only `checks`, in the given order
    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks = checks.into_iter().collect();
        self
    }

    /// Checks this validator runs
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Context handed to each check
    pub fn context(&self) -> CheckContext<'_> {
        CheckContext {
            prd_prefix:          &self.prd_prefix,
            srs_prefix:          &self.srs_prefix,
            short_test_name_len: self.short_test_name_len,
            references:          &self.references,
        }
    }

    /// Run a single check
    pub fn check(&self, check: Check, rows: Vec<TraceRow>) -> Partition {
        check.run(rows, &self.context())
    }

    /// Run every configured check
    pub fn validate(&self, rows: Vec<TraceRow>) -> ValidationOutput {
        let ctx = self.context();
        let mut valid = rows;
        let mut stages = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let input = valid.len();
            let partition = check.run(valid, &ctx);
            info!(
                check = %check,
                input,
                valid = partition.valid.len(),
                invalid = partition.invalid.len(),
                "validation stage finished"
            );
            for rejected in &partition.invalid {
                debug!(check = %check, srs_id = ?rejected.srs_id, test_name = %rejected.test_name, "row rejected");
            }

            valid = partition.valid;
            stages.push(StageResult {
                check: *check,
                input,
                invalid: partition.invalid,
            });
        }

        ValidationOutput { valid, stages }
    }
}
