//! Plain-text run summary.
//!
//! Counts per outcome, then error details when there are any, then timing.

use std::time::Duration;

use crate::types::RunReport;

/// Render the end-of-run summary.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(if report.dry_run { "PROCESSING SUMMARY (dry-run)\n" } else { "PROCESSING SUMMARY\n" });
    out.push_str(&rule);
    out.push('\n');

    if let Some(reason) = &report.aborted {
        out.push_str(&format!("Aborted: {}\n", reason));
        out.push_str("No artifacts were touched.\n");
        return out;
    }

    let s = &report.stats;
    out.push_str(&format!("Already up-to-date: {}\n", s.unchanged));
    out.push_str(&format!("Added: {}\n", s.added));
    out.push_str(&format!("Updated: {}\n", s.updated));
    out.push_str(&format!("Skipped: {}\n", s.skipped));
    out.push_str(&format!("Errors: {}\n", s.errors));
    if s.partial > 0 {
        out.push_str(&format!("Without MCE segment (vlanId only): {}\n", s.partial));
    }
    out.push_str(&format!("Total clusters: {}\n", s.total()));

    let errors: Vec<_> = report.errors().collect();
    if !errors.is_empty() {
        out.push_str("\nError details:\n");
        for r in errors {
            out.push_str(&format!(
                "  {}: {}\n",
                r.cluster_name,
                r.message.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    let total: Duration = report.results.iter().map(|r| r.elapsed).sum();
    let avg = if report.results.is_empty() {
        0.0
    } else {
        total.as_secs_f64() / report.results.len() as f64
    };
    out.push_str(&format!(
        "\nTotal: {:.2}s, Avg: {:.3}s/cluster\n",
        total.as_secs_f64(),
        avg
    ));

    out
}
