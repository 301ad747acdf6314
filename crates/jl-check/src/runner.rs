//! Catalog execution

use crate::equivalence::{compare, subset_check, Comparison};
use crate::executor::{DualExecutor, QueryError, SideRun};
use jl_core::{CatalogEntry, Expectation, OrderingHint};
use jl_db::{Cell, Database};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Reason attached to a not-representable entry whose denormalized query lost nothing
pub const STALE_LABEL_NOTE: &str =
    "denormalized query returned every normalized row; the not-representable label may be stale";

/// Final status of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Both queries agree
    Passed,
    /// The queries disagree
    Failed,
    /// The denormalized query omits rows, as the catalog says it must
    NotRepresentable,
    /// Not compared
    Skipped,
    /// A query could not be run
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Passed => write!(f, "passed"),
            EntryStatus::Failed => write!(f, "failed"),
            EntryStatus::NotRepresentable => write!(f, "not representable"),
            EntryStatus::Skipped => write!(f, "skipped"),
            EntryStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of validating one catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub id: String,
    pub index: usize,
    pub question: String,
    /// Line of the entry's heading in the catalog
    pub line: usize,
    pub status: EntryStatus,

    /// Whether rows were compared by position
    pub ordered: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denormalized_rows: Option<usize>,

    /// Why the entry was skipped or failed, or a note on a suspicious pass, in one line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Row comparison details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,

    /// Normalized rows the denormalized query cannot produce
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted_rows: Vec<Vec<Cell>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,

    #[serde(skip)]
    pub duration: Duration,
}

impl EntryResult {
    fn new(entry: &CatalogEntry, status: EntryStatus) -> Self {
        Self {
            id: entry.id.clone(),
            index: entry.index,
            question: entry.question.clone(),
            line: entry.line,
            status,
            ordered: false,
            normalized_rows: None,
            denormalized_rows: None,
            reason: None,
            comparison: None,
            omitted_rows: Vec::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Create a skipped result
    pub fn skipped(entry: &CatalogEntry, reason: &str) -> Self {
        Self {
            reason: Some(reason.to_string()),
            ..Self::new(entry, EntryStatus::Skipped)
        }
    }

    /// Create an error result
    pub fn error(entry: &CatalogEntry, errors: Vec<QueryError>) -> Self {
        Self {
            errors,
            ..Self::new(entry, EntryStatus::Error)
        }
    }

    /// Whether this entry makes the run fail
    pub fn is_failure(&self) -> bool {
        matches!(self.status, EntryStatus::Failed | EntryStatus::Error)
    }
}

/// Summary of a catalog run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_representable: usize,
    pub skipped: usize,
    pub errors: usize,

    /// Entries left unrun after a fail-fast stop
    pub not_run: usize,

    #[serde(skip)]
    pub duration: Duration,
}

impl RunSummary {
    /// Create a summary from entry results
    pub fn from_results(results: &[EntryResult], duration: Duration) -> Self {
        let count = |status: EntryStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            passed: count(EntryStatus::Passed),
            failed: count(EntryStatus::Failed),
            not_representable: count(EntryStatus::NotRepresentable),
            skipped: count(EntryStatus::Skipped),
            errors: count(EntryStatus::Error),
            not_run: 0,
            duration,
        }
    }

    /// Check if no entry failed or errored
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Options for a catalog run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Absolute tolerance for numeric comparisons
    pub tolerance: f64,
    /// Stop after the first failed or errored entry
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            fail_fast: false,
        }
    }
}

/// Runs catalog entries against a loaded database
pub struct CatalogRunner<'a> {
    executor: DualExecutor<'a>,
    options: RunOptions,
}

impl<'a> CatalogRunner<'a> {
    pub fn new(db: &'a dyn Database, options: RunOptions) -> Self {
        Self {
            executor: DualExecutor::new(db),
            options,
        }
    }

    /// Validate a single entry
    pub async fn run_entry(&self, entry: &CatalogEntry) -> EntryResult {
        let start = Instant::now();
        let mut result = self.evaluate(entry).await;
        result.duration = start.elapsed();
        result
    }

    async fn evaluate(&self, entry: &CatalogEntry) -> EntryResult {
        if entry.skip {
            return EntryResult::skipped(entry, "skipped by directive");
        }
        if entry.expectation == Expectation::Equivalent && entry.denormalized.is_none() {
            return EntryResult::skipped(entry, "no denormalized query");
        }

        let outcome = self.executor.run(entry).await;
        let errors = outcome.errors();
        if !errors.is_empty() {
            return EntryResult::error(entry, errors);
        }

        let (normalized, denormalized) = match (outcome.normalized, outcome.denormalized) {
            (Ok(n), Some(Ok(d))) => (n, Some(d)),
            (Ok(n), None) => (n, None),
            // errors were handled above
            _ => return EntryResult::error(entry, Vec::new()),
        };

        match entry.expectation {
            Expectation::Equivalent => match denormalized {
                Some(d) => self.check_equivalent(entry, &normalized, &d),
                None => EntryResult::skipped(entry, "no denormalized query"),
            },
            Expectation::NotRepresentable => {
                self.check_not_representable(entry, &normalized, denormalized.as_ref())
            }
        }
    }

    fn is_ordered(entry: &CatalogEntry, normalized: &SideRun, denormalized: &SideRun) -> bool {
        match entry.ordering {
            OrderingHint::Ordered => true,
            OrderingHint::Unordered => false,
            OrderingHint::Auto => normalized.shape.ordered && denormalized.shape.ordered,
        }
    }

    fn check_equivalent(
        &self,
        entry: &CatalogEntry,
        normalized: &SideRun,
        denormalized: &SideRun,
    ) -> EntryResult {
        let ordered = Self::is_ordered(entry, normalized, denormalized);
        let comparison = compare(
            &normalized.rows,
            &denormalized.rows,
            ordered,
            self.options.tolerance,
        );

        let (status, reason) = if comparison.matches {
            (EntryStatus::Passed, None)
        } else if let Some(columns) = &comparison.column_mismatch {
            (EntryStatus::Failed, Some(columns.clone()))
        } else if ordered {
            (
                EntryStatus::Failed,
                Some(format!(
                    "{} rows differ by position",
                    comparison.positional.len()
                )),
            )
        } else {
            (
                EntryStatus::Failed,
                Some(format!(
                    "{} rows only in normalized, {} rows only in denormalized",
                    comparison.only_in_normalized.len(),
                    comparison.only_in_denormalized.len()
                )),
            )
        };

        EntryResult {
            ordered,
            normalized_rows: Some(normalized.rows.len()),
            denormalized_rows: Some(denormalized.rows.len()),
            reason,
            comparison: Some(comparison),
            ..EntryResult::new(entry, status)
        }
    }

    fn check_not_representable(
        &self,
        entry: &CatalogEntry,
        normalized: &SideRun,
        denormalized: Option<&SideRun>,
    ) -> EntryResult {
        let Some(denormalized) = denormalized else {
            return EntryResult {
                normalized_rows: Some(normalized.rows.len()),
                reason: Some("no denormalized query".to_string()),
                omitted_rows: normalized.rows.rows.clone(),
                ..EntryResult::new(entry, EntryStatus::NotRepresentable)
            };
        };

        let comparison = subset_check(&normalized.rows, &denormalized.rows, self.options.tolerance);

        let (status, reason) = if comparison.matches && comparison.only_in_normalized.is_empty() {
            log::warn!(
                "Entry '{}' is marked not representable but its denormalized query omitted no rows",
                entry.id
            );
            (EntryStatus::NotRepresentable, Some(STALE_LABEL_NOTE.to_string()))
        } else if comparison.matches {
            (EntryStatus::NotRepresentable, None)
        } else if let Some(columns) = &comparison.column_mismatch {
            (EntryStatus::Failed, Some(columns.clone()))
        } else {
            (
                EntryStatus::Failed,
                Some(format!(
                    "denormalized query returned {} rows absent from the normalized result",
                    comparison.only_in_denormalized.len()
                )),
            )
        };

        let omitted_rows = if comparison.matches {
            comparison.only_in_normalized.clone()
        } else {
            Vec::new()
        };

        EntryResult {
            normalized_rows: Some(normalized.rows.len()),
            denormalized_rows: Some(denormalized.rows.len()),
            reason,
            omitted_rows,
            comparison: (!comparison.matches).then_some(comparison),
            ..EntryResult::new(entry, status)
        }
    }

    /// Validate entries in order
    pub async fn run_all(&self, entries: &[&CatalogEntry]) -> (Vec<EntryResult>, RunSummary) {
        let start = Instant::now();
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            let result = self.run_entry(entry).await;
            log::debug!("Entry '{}': {}", entry.id, result.status);
            let stop = self.options.fail_fast && result.is_failure();
            results.push(result);
            if stop {
                log::info!("Stopping after '{}' (fail fast)", entry.id);
                break;
            }
        }

        let mut summary = RunSummary::from_results(&results, start.elapsed());
        summary.not_run = entries.len() - results.len();
        (results, summary)
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
