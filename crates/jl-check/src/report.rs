//! Text and JSON rendering of check results
//!
//! Rendering is pure: the same results always produce the same text.
//! Durations appear only when `timings` is set.

use crate::equivalence::Comparison;
use crate::invariants::{InvariantResult, InvariantSummary};
use crate::runner::{EntryResult, EntryStatus, RunSummary};
use jl_db::result::format_row;
use jl_db::Cell;
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

/// Rendering options
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Append durations to result lines
    pub timings: bool,
    /// Rows listed per diff section before eliding the rest
    pub max_diff_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            timings: false,
            max_diff_rows: 5,
        }
    }
}

impl ReportOptions {
    fn timing(&self, duration: Duration) -> String {
        if self.timings {
            format!(" [{}ms]", duration.as_millis())
        } else {
            String::new()
        }
    }
}

/// Everything `jl check` reports, for JSON output
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub invariants: &'a [InvariantResult],
    pub invariant_summary: &'a InvariantSummary,
    pub entries: &'a [EntryResult],
    pub summary: &'a RunSummary,
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &CheckReport<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn status_symbol(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Passed => "✓",
        EntryStatus::Failed | EntryStatus::Error => "✗",
        EntryStatus::NotRepresentable => "~",
        EntryStatus::Skipped => "-",
    }
}

/// Write at most `limit` rows under `label`, then a count of the rest
fn write_rows<'r>(
    out: &mut String,
    label: &str,
    rows: impl ExactSizeIterator<Item = &'r Vec<Cell>>,
    limit: usize,
) {
    let total = rows.len();
    for row in rows.take(limit) {
        let _ = writeln!(out, "    {}: {}", label, format_row(row));
    }
    if total > limit {
        let _ = writeln!(out, "    ... and {} more", total - limit);
    }
}

fn write_comparison(out: &mut String, comparison: &Comparison, limit: usize) {
    for note in &comparison.notes {
        let _ = writeln!(out, "    note: {}", note);
    }

    let total = comparison.positional.len();
    for mismatch in comparison.positional.iter().take(limit) {
        let side = |row: &Option<Vec<Cell>>| {
            row.as_deref()
                .map_or("<no row>".to_string(), format_row)
        };
        let _ = writeln!(
            out,
            "    row {}: normalized {} / denormalized {}",
            mismatch.index + 1,
            side(&mismatch.normalized),
            side(&mismatch.denormalized)
        );
    }
    if total > limit {
        let _ = writeln!(out, "    ... and {} more", total - limit);
    }

    write_rows(
        out,
        "only in normalized",
        comparison.only_in_normalized.iter(),
        limit,
    );
    write_rows(
        out,
        "only in denormalized",
        comparison.only_in_denormalized.iter(),
        limit,
    );
}

/// Render one entry result
pub fn render_entry(result: &EntryResult, options: &ReportOptions) -> String {
    let mut out = String::new();
    let symbol = status_symbol(result.status);
    let timing = options.timing(result.duration);

    match result.status {
        EntryStatus::Passed => {
            let _ = writeln!(out, "  {} {}{}", symbol, result.id, timing);
        }
        EntryStatus::NotRepresentable => {
            let _ = writeln!(
                out,
                "  {} {} (not representable, {} rows omitted){}",
                symbol,
                result.id,
                result.omitted_rows.len(),
                timing
            );
            write_rows(&mut out, "omitted", result.omitted_rows.iter(), options.max_diff_rows);
            if let (Some(_), Some(reason)) = (result.denormalized_rows, &result.reason) {
                let _ = writeln!(out, "    note: {}", reason);
            }
        }
        EntryStatus::Skipped => {
            let _ = writeln!(
                out,
                "  {} {} (skipped: {})",
                symbol,
                result.id,
                result.reason.as_deref().unwrap_or("not compared")
            );
        }
        EntryStatus::Failed => {
            let _ = writeln!(
                out,
                "  {} {} - {}{}",
                symbol,
                result.id,
                result.reason.as_deref().unwrap_or("results differ"),
                timing
            );
        }
        EntryStatus::Error => {
            let _ = writeln!(out, "  {} {} - query error{}", symbol, result.id, timing);
            for error in &result.errors {
                let _ = writeln!(out, "    {}", error);
            }
        }
    }

    if let Some(comparison) = &result.comparison {
        write_comparison(&mut out, comparison, options.max_diff_rows);
    }

    out
}

/// Render the catalog section of a check report
pub fn render_entries(
    results: &[EntryResult],
    summary: &RunSummary,
    options: &ReportOptions,
) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&render_entry(result, options));
    }

    let _ = write!(
        out,
        "\nPassed: {}, Failed: {}, Errors: {}, Not representable: {}, Skipped: {}",
        summary.passed, summary.failed, summary.errors, summary.not_representable, summary.skipped
    );
    if summary.not_run > 0 {
        let _ = write!(out, ", Not run: {}", summary.not_run);
    }
    let _ = writeln!(out, "{}", options.timing(summary.duration));
    out
}

/// Render one invariant result
pub fn render_invariant(result: &InvariantResult, options: &ReportOptions) -> String {
    let mut out = String::new();
    let timing = options.timing(result.duration);

    if result.passed {
        let _ = writeln!(out, "  ✓ {}{}", result.name, timing);
    } else if let Some(error) = &result.error {
        let _ = writeln!(out, "  ✗ {} - {}{}", result.name, error, timing);
    } else {
        let _ = writeln!(
            out,
            "  ✗ {} ({} violating rows){}",
            result.name, result.violation_count, timing
        );
        if !result.samples.is_empty() {
            let _ = writeln!(out, "    Sample violating rows:");
            for (i, row) in result.samples.iter().enumerate() {
                let _ = writeln!(out, "      {}. {}", i + 1, row);
            }
            if result.violation_count > result.samples.len() {
                let _ = writeln!(
                    out,
                    "      ... and {} more",
                    result.violation_count - result.samples.len()
                );
            }
        }
    }
    out
}

/// Render invariant results.
///
/// With `failures_only` passing checks are folded into the summary line.
pub fn render_invariants(
    results: &[InvariantResult],
    summary: &InvariantSummary,
    options: &ReportOptions,
    failures_only: bool,
) -> String {
    let mut out = String::new();
    for result in results.iter().filter(|r| !(failures_only && r.passed)) {
        out.push_str(&render_invariant(result, options));
    }
    let _ = writeln!(
        out,
        "Fixture invariants passed: {}, Failed: {}",
        summary.passed,
        summary.failed + summary.errors
    );
    out
}

/// Render the full text report of `jl check`
pub fn render_text(report: &CheckReport<'_>, options: &ReportOptions) -> String {
    let mut out = render_invariants(report.invariants, report.invariant_summary, options, true);
    out.push('\n');
    let _ = writeln!(
        out,
        "Checking {} catalog entries...\n",
        report.entries.len() + report.summary.not_run
    );
    out.push_str(&render_entries(report.entries, report.summary, options));
    out
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
