//! Error types for jl-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// CSV loading error (D004)
    #[error("[D004] CSV load failed: {0}")]
    CsvError(String),

    /// Fixture loading error (D005)
    #[error("[D005] Fixture load failed for {relation}: {message}")]
    FixtureError { relation: String, message: String },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// SQL rejected by the engine's parser (D007)
    #[error("[D007] SQL syntax error: {0}")]
    SyntaxError(String),

    /// Unknown column, function or relation (D008)
    #[error("[D008] SQL binding error: {0}")]
    BindError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Classify an engine error message.
    ///
    /// duckdb::Error carries no structured variants, so the message prefix
    /// DuckDB puts on every error ("Parser Error:", "Binder Error:", ...)
    /// is the only thing to go on.
    pub fn classify(msg: String) -> Self {
        if msg.contains("Parser Error") {
            DbError::SyntaxError(msg)
        } else if msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else if msg.contains("Binder Error") || msg.contains("Catalog Error") {
            DbError::BindError(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::classify(err.to_string())
    }
}
