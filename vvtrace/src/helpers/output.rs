//! Human-readable run reports

use std::fmt::Write;

use colored::Colorize;
use vvtrace_core::{coverage::TraceCoverage, RejectReason, RunSummary};

/// Render the run summary block
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Trace Matrix Summary ===".bright_blue());
    let _ = writeln!(
        out,
        "Generated:          {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Input records:      {}", summary.input_records);
    let _ = writeln!(out, "Normalized records: {}", summary.normalized_records);
    let _ = writeln!(out, "Built rows:         {}", summary.built_rows);
    let _ = writeln!(out, "Untraced records:   {}", summary.dropped_records);
    if summary.supplied_rows > 0 {
        let _ = writeln!(out, "Supplied rows:      {}", summary.supplied_rows);
    }
    let _ = writeln!(
        out,
        "Matrix rows:        {}",
        summary.matrix_rows.to_string().bright_green()
    );

    let total = summary.total_rejected();
    if total == 0 {
        let _ = writeln!(out, "Rejected:           {}", "0".bright_green());
        return out;
    }

    let _ = writeln!(
        out,
        "Rejected:           {} ({} in error log)",
        total.to_string().bright_red(),
        summary.exported_rejects
    );
    for reason in RejectReason::ALL {
        if let Some(count) = summary.rejected.get(&reason) {
            let _ = writeln!(out, "  {:<40} {}", reason.as_str(), count.to_string().yellow());
        }
    }
    out
}

/// Render the trace coverage audit
pub fn render_coverage(coverage: &TraceCoverage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Trace Coverage ===".bright_blue());
    let _ = writeln!(
        out,
        "Traced tests:   {} ({:.1}%)",
        coverage.traced.len(),
        coverage.traced_percentage()
    );
    let _ = writeln!(out, "Untraced tests: {}", coverage.untraced.len());
    for (test_name, missing) in &coverage.untraced {
        let _ = writeln!(out, "  {} {} (missing {})", "✗".bright_red(), test_name, missing.join(", "));
    }
    out
}
