//! Fixture invariant checks
//!
//! Every check is a query that returns the rows violating one data-model
//! invariant. Zero rows means the invariant holds.

use jl_core::schema::{ColumnCheck, RelationDef, RelationKind, RELATIONS};
use jl_core::sql_utils::quote_ident;
use jl_db::Database;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Generate SQL for a unique check
///
/// Returns rows that violate the unique constraint (duplicates).
pub fn generate_unique_sql(table: &str, column: &str) -> String {
    let qt = quote_ident(table);
    let qc = quote_ident(column);
    format!("SELECT {qc}, COUNT(*) as cnt\nFROM {qt}\nGROUP BY {qc}\nHAVING COUNT(*) > 1")
}

/// Generate SQL for a not_null check
///
/// Returns rows where the column is NULL.
pub fn generate_not_null_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} IS NULL",
        quote_ident(table),
        quote_ident(column)
    )
}

/// Generate SQL for a positive check
///
/// Returns rows where the column value is <= 0.
pub fn generate_positive_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} <= 0",
        quote_ident(table),
        quote_ident(column)
    )
}

/// Generate SQL for a non_negative check
///
/// Returns rows where the column value is < 0.
pub fn generate_non_negative_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} < 0",
        quote_ident(table),
        quote_ident(column)
    )
}

/// Generate SQL for a relationship check (foreign key validation)
///
/// Returns rows where the column value does not exist in the referenced table.
pub fn generate_relationship_sql(
    table: &str,
    column: &str,
    ref_table: &str,
    ref_column: &str,
) -> String {
    let qt = quote_ident(table);
    let qc = quote_ident(column);
    let qrt = quote_ident(ref_table);
    let qrc = quote_ident(ref_column);
    format!(
        "SELECT src.{qc}\n\
         FROM {qt} AS src\n\
         WHERE src.{qc} IS NOT NULL\n\
         \x20 AND NOT EXISTS (\n\
         \x20   SELECT 1 FROM {qrt} AS ref_tbl\n\
         \x20   WHERE ref_tbl.{qrc} = src.{qc}\n\
         \x20 )"
    )
}

/// Kind of invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "references")]
pub enum InvariantKind {
    Unique,
    NotNull,
    /// Every value exists in the named relation
    Relationship(&'static str),
    Positive,
    NonNegative,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantKind::Unique => write!(f, "unique"),
            InvariantKind::NotNull => write!(f, "not_null"),
            InvariantKind::Relationship(_) => write!(f, "relationship"),
            InvariantKind::Positive => write!(f, "positive"),
            InvariantKind::NonNegative => write!(f, "non_negative"),
        }
    }
}

impl From<ColumnCheck> for InvariantKind {
    fn from(check: ColumnCheck) -> Self {
        match check {
            ColumnCheck::Positive => InvariantKind::Positive,
            ColumnCheck::NonNegative => InvariantKind::NonNegative,
        }
    }
}

/// A generated invariant check
#[derive(Debug, Clone)]
pub struct Invariant {
    /// Check name, e.g. `positive_cart_quantity`
    pub name: String,
    pub relation: &'static str,
    pub column: &'static str,
    pub kind: InvariantKind,
    /// Query returning violating rows
    pub sql: String,
}

impl Invariant {
    fn new(relation: &'static str, column: &'static str, kind: InvariantKind) -> Self {
        let sql = match kind {
            InvariantKind::Unique => generate_unique_sql(relation, column),
            InvariantKind::NotNull => generate_not_null_sql(relation, column),
            InvariantKind::Relationship(target) => {
                generate_relationship_sql(relation, column, target, column)
            }
            InvariantKind::Positive => generate_positive_sql(relation, column),
            InvariantKind::NonNegative => generate_non_negative_sql(relation, column),
        };
        let name = match kind {
            InvariantKind::Relationship(target) => {
                format!("relationship_{}_{}_to_{}", relation, column, target)
            }
            other => format!("{}_{}_{}", other, relation, column),
        };
        Self {
            name,
            relation,
            column,
            kind,
            sql,
        }
    }
}

/// Checks for one relation: key uniqueness and presence, references
/// (normalized relations only) and value checks
pub fn relation_invariants(relation: &'static RelationDef) -> Vec<Invariant> {
    let mut checks = vec![
        Invariant::new(relation.name, relation.key, InvariantKind::Unique),
        Invariant::new(relation.name, relation.key, InvariantKind::NotNull),
    ];

    for column in relation.columns {
        if relation.kind == RelationKind::Normalized {
            if let Some(target) = column.references {
                checks.push(Invariant::new(
                    relation.name,
                    column.name,
                    InvariantKind::Relationship(target),
                ));
            }
        }
        if let Some(check) = column.check {
            checks.push(Invariant::new(relation.name, column.name, check.into()));
        }
    }

    checks
}

/// Checks for every relation, in load order
pub fn fixture_invariants() -> Vec<Invariant> {
    RELATIONS.iter().flat_map(relation_invariants).collect()
}

/// Result of a single invariant check
#[derive(Debug, Clone, Serialize)]
pub struct InvariantResult {
    pub name: String,
    pub relation: String,
    pub kind: InvariantKind,

    /// Whether the invariant holds
    pub passed: bool,

    /// Number of violating rows (0 if passed)
    pub violation_count: usize,

    /// Sample violating rows as formatted strings
    pub samples: Vec<String>,

    /// Error message if the check query failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    pub duration: Duration,
}

impl InvariantResult {
    fn base(check: &Invariant, duration: Duration) -> Self {
        Self {
            name: check.name.clone(),
            relation: check.relation.to_string(),
            kind: check.kind,
            passed: true,
            violation_count: 0,
            samples: Vec::new(),
            error: None,
            duration,
        }
    }

    /// Create a passed result
    pub fn pass(check: &Invariant, duration: Duration) -> Self {
        Self::base(check, duration)
    }

    /// Create a failed result
    pub fn fail(
        check: &Invariant,
        violation_count: usize,
        samples: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            passed: false,
            violation_count,
            samples,
            ..Self::base(check, duration)
        }
    }

    /// Create an error result
    pub fn error(check: &Invariant, error: String, duration: Duration) -> Self {
        Self {
            passed: false,
            error: Some(error),
            ..Self::base(check, duration)
        }
    }
}

/// Summary of an invariant run
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvariantSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl InvariantSummary {
    pub fn from_results(results: &[InvariantResult]) -> Self {
        let errors = results.iter().filter(|r| r.error.is_some()).count();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed - errors,
            errors,
        }
    }

    /// Check if every invariant holds
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Runs invariant checks against a loaded database
pub struct InvariantRunner<'a> {
    db: &'a dyn Database,
    max_samples: usize,
}

impl<'a> InvariantRunner<'a> {
    pub fn new(db: &'a dyn Database, max_samples: usize) -> Self {
        Self { db, max_samples }
    }

    /// Run a single check
    pub async fn run_check(&self, check: &Invariant) -> InvariantResult {
        let start = Instant::now();

        match self.db.query_count(&check.sql).await {
            Ok(0) => InvariantResult::pass(check, start.elapsed()),
            Ok(count) => {
                let samples = self
                    .db
                    .query_sample_rows(&check.sql, self.max_samples)
                    .await
                    .unwrap_or_default();
                log::debug!("Invariant {} violated by {} rows", check.name, count);
                InvariantResult::fail(check, count, samples, start.elapsed())
            }
            Err(e) => InvariantResult::error(check, e.to_string(), start.elapsed()),
        }
    }

    /// Run every check in order
    pub async fn run_all(&self, checks: &[Invariant]) -> (Vec<InvariantResult>, InvariantSummary) {
        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            results.push(self.run_check(check).await);
        }
        let summary = InvariantSummary::from_results(&results);
        (results, summary)
    }
}

#[cfg(test)]
#[path = "invariants_test.rs"]
mod tests;
