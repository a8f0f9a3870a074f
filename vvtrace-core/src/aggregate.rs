//! Error log aggregation
//!
//! Every stage hands its rejects over as a separate batch. The error log is
//! their concatenation in pipeline order. No deduplication happens: a row can
//! only be rejected once because each stage only sees the previous stage's
//! valid rows.

use std::collections::BTreeMap;

use crate::trace::{
    RejectReason,
    RejectedRow,
};

/// Ordered audit table of every rejected record and row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    rows: Vec<RejectedRow>,
}

impl ErrorLog {
    /// Create an empty error log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of rejects after everything already logged
    pub fn push_batch(&mut self, batch: impl IntoIterator<Item = RejectedRow>) {
        self.rows.extend(batch);
    }

    /// Logged rows in order
    pub fn rows(&self) -> &[RejectedRow] {
        &self.rows
    }

    /// Consume the log into its rows
    pub fn into_rows(self) -> Vec<RejectedRow> {
        self.rows
    }

    /// Number of logged rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing was rejected
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows per reason
    pub fn reason_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.error_reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Concatenate reject batches in the order given
pub fn aggregate<I, B>(batches: I) -> ErrorLog
where
    I: IntoIterator<Item = B>,
    B: IntoIterator<Item = RejectedRow>,
{
    let mut log = ErrorLog::new();
    for batch in batches {
        log.push_batch(batch);
    }
    log
}
