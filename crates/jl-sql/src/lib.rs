//! jl-sql - SQL parsing layer for Joinlab
//!
//! Wraps sqlparser-rs with the DuckDB dialect, checks that catalog queries
//! are single read-only statements, and inspects the shape of a query
//! (top-level ORDER BY, referenced relations).

pub mod dialect;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod validator;

pub use dialect::{DuckDbDialect, SqlDialect};
pub use error::SqlError;
pub use extractor::QueryShape;
pub use parser::SqlParser;
pub use validator::validate_single_query;
