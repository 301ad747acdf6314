//! Dual query execution
//!
//! Runs the normalized and denormalized query of a catalog entry against the
//! same loaded database and captures each side's rows or error.

use jl_core::CatalogEntry;
use jl_db::{Database, DbError, ResultSet};
use jl_sql::{QueryShape, SqlError, SqlParser};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which query of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Normalized,
    Denormalized,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Normalized => write!(f, "normalized"),
            Side::Denormalized => write!(f, "denormalized"),
        }
    }
}

/// Classification of a query failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryErrorKind {
    /// The query does not parse
    Syntax,
    /// Not a single read-only query
    Unsupported,
    /// Unknown relation, column or function
    Binding,
    /// Failed while running
    Execution,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryErrorKind::Syntax => write!(f, "syntax error"),
            QueryErrorKind::Unsupported => write!(f, "unsupported statement"),
            QueryErrorKind::Binding => write!(f, "binding error"),
            QueryErrorKind::Execution => write!(f, "execution error"),
        }
    }
}

/// A failed query, naming the entry and side it belongs to
#[derive(Debug, Clone, Error, Serialize)]
#[error("{side} query of '{entry}': {kind}{}: {message}", location(.line, .column))]
pub struct QueryError {
    pub entry: String,
    pub side: Side,
    pub kind: QueryErrorKind,
    pub message: String,
    /// Line within the query text, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {}, column {}", l, c),
        _ => String::new(),
    }
}

impl QueryError {
    fn new(entry: &str, side: Side, kind: QueryErrorKind, message: String) -> Self {
        Self {
            entry: entry.to_string(),
            side,
            kind,
            message,
            line: None,
            column: None,
        }
    }

    fn from_sql(entry: &str, side: Side, err: SqlError) -> Self {
        match err {
            SqlError::ParseError {
                message,
                line,
                column,
            } => Self {
                line: (line > 0).then_some(line),
                column: (line > 0).then_some(column),
                ..Self::new(entry, side, QueryErrorKind::Syntax, message)
            },
            SqlError::EmptySql => Self::new(entry, side, QueryErrorKind::Syntax, err.to_string()),
            SqlError::UnsupportedStatement(_) | SqlError::MultipleStatements(_) => {
                Self::new(entry, side, QueryErrorKind::Unsupported, err.to_string())
            }
        }
    }

    fn from_db(entry: &str, side: Side, err: DbError) -> Self {
        let kind = match err {
            DbError::SyntaxError(_) => QueryErrorKind::Syntax,
            DbError::BindError(_) | DbError::TableNotFound(_) => QueryErrorKind::Binding,
            _ => QueryErrorKind::Execution,
        };
        Self::new(entry, side, kind, err.to_string())
    }
}

/// Rows and shape of one successfully executed query
#[derive(Debug, Clone)]
pub struct SideRun {
    pub shape: QueryShape,
    pub rows: ResultSet,
}

/// Outcome of running both queries of an entry
#[derive(Debug)]
pub struct DualOutcome {
    pub normalized: Result<SideRun, QueryError>,
    /// `None` when the entry has no denormalized query
    pub denormalized: Option<Result<SideRun, QueryError>>,
}

impl DualOutcome {
    /// Errors of both sides, normalized first
    pub fn errors(&self) -> Vec<QueryError> {
        let mut errors = Vec::new();
        if let Err(e) = &self.normalized {
            errors.push(e.clone());
        }
        if let Some(Err(e)) = &self.denormalized {
            errors.push(e.clone());
        }
        errors
    }
}

/// Runs catalog query pairs against a database
pub struct DualExecutor<'a> {
    db: &'a dyn Database,
    parser: SqlParser,
}

impl<'a> DualExecutor<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self {
            db,
            parser: SqlParser::duckdb(),
        }
    }

    /// Parse, validate and execute a single query
    pub async fn run_query(&self, entry: &str, side: Side, sql: &str) -> Result<SideRun, QueryError> {
        let shape = self
            .parser
            .parse_query(sql)
            .map_err(|e| QueryError::from_sql(entry, side, e))?;

        let rows = self
            .db
            .query_rows(sql)
            .await
            .map_err(|e| QueryError::from_db(entry, side, e))?;

        log::debug!("{} query of '{}' returned {} rows", side, entry, rows.len());
        Ok(SideRun { shape, rows })
    }

    /// Run both queries of an entry; the sides fail independently
    pub async fn run(&self, entry: &CatalogEntry) -> DualOutcome {
        let normalized = self
            .run_query(&entry.id, Side::Normalized, &entry.normalized)
            .await;

        let denormalized = match &entry.denormalized {
            Some(sql) => Some(self.run_query(&entry.id, Side::Denormalized, sql).await),
            None => None,
        };

        DualOutcome {
            normalized,
            denormalized,
        }
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
