//! jl-check - Validation engine for Joinlab
//!
//! This crate checks fixture invariants, runs each catalog entry's query
//! pair against the loaded database, compares the two result sets and
//! renders the outcome.

pub mod equivalence;
pub mod executor;
pub mod invariants;
pub mod report;
pub mod runner;

pub use equivalence::{compare, subset_check, Comparison};
pub use executor::{DualExecutor, QueryError, QueryErrorKind, Side};
pub use invariants::{fixture_invariants, InvariantResult, InvariantRunner, InvariantSummary};
pub use report::{render_json, render_text, CheckReport, ReportOptions};
pub use runner::{CatalogRunner, EntryResult, EntryStatus, RunOptions, RunSummary};
